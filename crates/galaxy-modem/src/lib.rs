//! The modem: a self-delimiting bit encoding of integers, unit and pairs,
//! plus the lift between decoded values and terms.

mod codec;
mod lift;

pub use codec::{decode_value, demodulate, encode_number, encode_value, modulate};
pub use lift::{demodulate_term, modulate_term, term_to_value, value_to_term};
