#![allow(clippy::too_many_arguments, clippy::collapsible_if, clippy::collapsible_else_if,
         clippy::manual_range_contains, clippy::comparison_chain, clippy::identity_op,
         clippy::needless_range_loop, clippy::new_without_default,
         clippy::field_reassign_with_default)]

pub mod doomdef;
pub mod doom_error;
pub mod common;
pub mod m_fixed;
pub mod m_bbox;
pub mod tables;
pub mod m_random;
pub mod m_argv;
pub mod d_config;
pub mod d_event;
pub mod wadfiles;
pub mod w_wad;
pub mod i_system;
