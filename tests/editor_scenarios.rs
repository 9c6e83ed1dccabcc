#[cfg(test)]
mod editor_scenarios {
    use icsnet::ip::{first_unused, next_address, Subnet};
    use icsnet::topology::{
        apply_command, BankInput, Command, GraphModel, GraphSnapshot, NetworkDocument, NodeDefaults, NodePatch,
        Position, Protocol, RegisterForm, Role,
    };
    use icsnet::validation::{save_decision, validate, Level, SaveDecision};
    use std::collections::HashSet;
    use std::net::Ipv4Addr;

    fn subnet() -> Subnet {
        "10.0.0.0/24".parse().unwrap()
    }

    fn sorted(mut snapshot: GraphSnapshot) -> GraphSnapshot {
        snapshot.nodes.sort_by(|a, b| a.id.cmp(&b.id));
        snapshot.edges.sort_by(|a, b| a.id.cmp(&b.id));
        snapshot
    }

    fn add(model: &mut GraphModel, x: f64) -> String {
        model.add_node(Position::new(x, 0.0), &NodeDefaults::default())
    }

    /// Master n1 and slave n2 on 10.0.0.2 with registers, connected without messages
    #[test]
    fn test_master_slave_pair_warns_only_about_schedule() {
        let mut model = GraphModel::new(subnet(), Protocol::Modbus);
        let n1 = add(&mut model, 0.0);
        let n2 = add(&mut model, 50.0);

        model
            .update_node(
                &n1,
                NodePatch { role: Some(Role::Master), ip: Some("10.0.0.10".into()), ..Default::default() },
            )
            .unwrap();
        let notices = model
            .update_node(
                &n2,
                NodePatch {
                    ip: Some("10.0.0.2".into()),
                    registers: Some(RegisterForm {
                        holding_registers: Some(BankInput::sequential("10,20,30")),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(notices.is_empty());
        model.add_edge(&n1, &n2).unwrap();

        let diagnostics = validate(&model.snapshot());
        let errors = diagnostics.iter().filter(|d| d.level == Level::Error).count();
        let warnings: Vec<_> = diagnostics.iter().filter(|d| d.level == Level::Warning).collect();
        assert_eq!(errors, 0);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("no messages"));
        assert!(matches!(save_decision(diagnostics), SaveDecision::Confirm(_)));
    }

    #[test]
    fn test_placed_nodes_skip_the_gateway() {
        let mut model = GraphModel::new(subnet(), Protocol::Modbus);
        let first = add(&mut model, 0.0);
        assert_eq!(model.node(&first).unwrap().ip, "10.0.0.2");
    }

    #[test]
    fn test_undo_redo_inverse_over_mixed_sequence() {
        let mut model = GraphModel::new(subnet(), Protocol::Modbus);
        let m = add(&mut model, 0.0);
        model
            .update_node(&m, NodePatch { role: Some(Role::Master), ..Default::default() })
            .unwrap();
        let s1 = add(&mut model, 1.0);
        let s2 = add(&mut model, 2.0);
        let e1 = model.add_edge(&m, &s1).unwrap();
        model.add_edge(&s2, &m).unwrap();
        model.delete_element(&e1).unwrap();
        model.delete_element(&m).unwrap();

        let mut states = vec![sorted(model.snapshot())];
        while model.undo() {
            states.push(sorted(model.snapshot()));
        }
        assert_eq!(states.len(), 8);
        assert!(model.nodes().is_empty());

        for expected in states.iter().rev().skip(1) {
            assert!(model.redo());
            assert_eq!(&sorted(model.snapshot()), expected);
            assert!(model.undo());
            assert!(model.redo());
            assert_eq!(&sorted(model.snapshot()), expected);
        }
        assert!(!model.redo());
    }

    #[test]
    fn test_redo_is_noop_after_new_add() {
        let mut model = GraphModel::new(subnet(), Protocol::Modbus);
        add(&mut model, 0.0);
        assert!(model.undo());
        add(&mut model, 0.0);
        let before = model.snapshot();
        assert!(!model.redo());
        assert_eq!(model.snapshot(), before);
    }

    #[test]
    fn test_commands_drive_a_session_and_persist() {
        let mut model = GraphModel::new(subnet(), Protocol::Modbus);
        let add_node = |x| Command::AddNode { position: Position::new(x, 0.0), defaults: None };

        let plc = apply_command(&mut model, add_node(0.0)).unwrap().created.unwrap();
        let meter = apply_command(&mut model, add_node(10.0)).unwrap().created.unwrap();
        apply_command(
            &mut model,
            Command::UpdateNode {
                id: plc.clone(),
                patch: NodePatch { role: Some(Role::Master), name: Some("PLC".into()), ..Default::default() },
            },
        )
        .unwrap();
        apply_command(&mut model, Command::AddEdge { a: meter.clone(), b: plc.clone() }).unwrap();

        let json = model.snapshot().to_document().to_json_pretty().unwrap();
        assert!(!json.contains("position"));
        let restored = GraphModel::from_snapshot(NetworkDocument::from_json(&json).unwrap().into_snapshot());
        assert_eq!(restored.snapshot(), model.snapshot());
        assert_eq!(restored.node(&plc).unwrap().name, "PLC");
        assert!(!restored.history().can_undo());
    }

    #[test]
    fn test_first_unused_never_returns_taken_address() {
        let subnet: Subnet = "192.168.10.0/28".parse().unwrap();
        let mut taken = HashSet::new();
        for _ in 0..15 {
            let ip = first_unused(&taken, &subnet).unwrap();
            assert!(!taken.contains(&ip));
            assert!(subnet.contains(ip));
            taken.insert(ip);
        }
        assert!(first_unused(&taken, &subnet).is_err());
    }

    #[test]
    fn test_next_address_cycles_last_octet_before_carrying() {
        let subnet: Subnet = "10.0.0.0/16".parse().unwrap();
        let mut ip = Ipv4Addr::new(10, 0, 3, 0);
        let mut seen = HashSet::new();
        for _ in 0..256 {
            let [a, b, c, d] = ip.octets();
            assert_eq!((a, b, c), (10, 0, 3));
            seen.insert(d);
            ip = next_address(ip, &subnet).unwrap();
        }
        assert_eq!(seen.len(), 256);
        assert_eq!(ip, Ipv4Addr::new(10, 0, 4, 0));
    }
}
