/*! Turn YulX trees back into text.
 *
 * One canonical shape per construct, two-space indentation, and stable
 * enough that parsing the output reproduces the tree. Works on both the
 * extended dialect and the plain-Yul subset the transformer leaves behind.
 */

pub mod emitter;
pub mod serializer;

pub use emitter::{EmitContext, EmitHelper, EmitResult, Emittable};
pub use serializer::serialize;
