/*! Cross-module checks for the core data model.
 *
 * Per-module edge cases live next to their modules; these tests exercise the
 * pieces together the way the transformer uses them.
 */

mod packing_tests;
mod selector_tests;
