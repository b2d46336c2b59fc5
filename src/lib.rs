//! Intersection Simulation Library
//!
//! A four-way signalized intersection: a phase scheduler grants right-of-way
//! to one lane at a time while vehicles queue, cross and turn. The core runs
//! headless; renderers consume the read-only snapshots it produces.

pub mod simulation;
