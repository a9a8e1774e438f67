mod model;

use proc_macro::TokenStream;

/// Creates a `XForm` struct for the model, holding the fields a client may submit.
///
/// Fields with `#[serde(skip_deserializing)]` or `#[serde(skip)]` are left out, all
/// other fields are copied verbatim (including their `serde` and `validate` attributes).
/// A `From<&X>` implementation is generated so that existing records can prefill a form.
#[proc_macro_attribute]
pub fn model(_args: TokenStream, input: TokenStream) -> TokenStream {
	model::from_input(input)
}
