//! One module per instruction-byte handler (spec.md sections 4.2-4.10).
//! Every handler is total: it writes exactly one SW1/SW2 pair into
//! `session.res` on every path and never returns an error to its caller
//! -- `dispatcher` is the only place a parse failure becomes a status
//! word before a handler even runs (spec.md section 7).

pub mod change_reference_data;
pub mod generate_asym_keypair;
pub mod get_put_data;
pub mod internal_authenticate;
pub mod pso;
pub mod read_binary;
pub mod reset_retry_counter;
pub mod select_file;
pub mod verify;
