#![allow(clippy::too_many_arguments, clippy::collapsible_if, clippy::collapsible_else_if,
         clippy::manual_range_contains, clippy::comparison_chain, clippy::identity_op,
         clippy::needless_range_loop, clippy::new_without_default,
         clippy::field_reassign_with_default)]

pub mod r_defs;
pub mod info;
pub mod p_local;
pub mod p_tick;
pub mod p_maputl;
pub mod p_map;
pub mod p_mobj;
pub mod p_floor;
pub mod p_doors;
pub mod p_ceilng;
pub mod p_plats;
pub mod p_spec;
pub mod p_user;
pub mod s_sound;
pub mod p_setup;
pub mod g_demo;
pub mod wi_stuff;
pub mod f_finale;
pub mod g_game;
pub mod d_main;
