//! # icsnet - Editor core for simulated Modbus networks
//!
//! This library provides the model, editing engine and run control behind a
//! network editor for simulated industrial (Modbus) networks.
//!
//! ## Overview
//!
//! An operator places master controllers and slave field devices, wires
//! master/slave links, schedules the requests each master sends over a link,
//! and launches a timed simulation whose progress is polled until it ends.
//! Rendering and page wiring live outside this crate; they talk to it through
//! commands and the [`topology::RenderSink`] change notifications.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - `ip`: Subnet arithmetic and address assignment
//! - `topology`: Devices, links, the editable graph and its command interface
//! - `history`: Undo/redo stacks of structural edits
//! - `schedule`: Message schedule parsing and validation
//! - `validation`: Pre-save diagnostics and the save policy
//! - `run`: Simulation run state machine and polling
//! - `api`: Scenario server interface and HTTP client
//! - `scenario`: Starter network generation and simulator export
//! - `config` / `config_loader`: YAML configuration
//! - `orchestrator`: Save, load, create and export workflows
//! - `utils`: Field input helpers and formatting
//!
//! ## Example Usage
//!
//! ```rust
//! use icsnet::topology::{GraphModel, NodeDefaults, NodePatch, Position, Protocol, Role};
//! use icsnet::validation::{validate, Level};
//!
//! let mut model = GraphModel::new("10.0.0.0/24".parse()?, Protocol::Modbus);
//! let plc = model.add_node(Position::new(0.0, 0.0), &NodeDefaults::default());
//! let pump = model.add_node(Position::new(100.0, 0.0), &NodeDefaults::default());
//! model.update_node(&plc, NodePatch { role: Some(Role::Master), ..Default::default() })?;
//! model.add_edge(&pump, &plc)?;
//!
//! let diagnostics = validate(&model.snapshot());
//! assert!(diagnostics.iter().all(|d| d.level == Level::Warning));
//!
//! assert!(model.undo());
//! assert!(model.edges().is_empty());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Configuration Format
//!
//! ```yaml
//! server:
//!   url: "http://127.0.0.1:8080"
//!   timeout: 30s
//! run:
//!   poll_interval: 1s
//! defaults:
//!   port: 502
//!   slave_id: 1
//!   protocol: modbus
//! log_level: info
//! ```
//!
//! ## Error Handling
//!
//! Library modules return typed errors built with `thiserror`. Field input
//! that does not parse keeps the previous value and is reported as a
//! [`utils::FieldError`] notice. The workflows in `orchestrator` and
//! `config_loader` return `color_eyre::Result` with context attached.

pub mod api;
pub mod config;
pub mod config_loader;
pub mod history;
pub mod ip;
pub mod orchestrator;
pub mod run;
pub mod scenario;
pub mod schedule;
pub mod topology;
pub mod utils;
pub mod validation;
