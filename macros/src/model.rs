use darling::{ast, FromDeriveInput, FromField};
use proc_macro2::TokenTree;
use quote::{format_ident, quote, ToTokens};
use syn::Meta;

#[derive(Debug, FromDeriveInput)]
#[darling(supports(struct_named), forward_attrs)]
struct ModelInputReceiver {
	ident: syn::Ident,

	generics: syn::Generics,

	data: ast::Data<(), ModelFieldReceiver>,

	attrs: Vec<syn::Attribute>,
}

#[derive(Debug, FromField)]
#[darling(forward_attrs)]
struct ModelFieldReceiver {
	ident: Option<syn::Ident>,

	ty: syn::Type,
	vis: syn::Visibility,

	attrs: Vec<syn::Attribute>,
}

/// Returns `true` if the attribute is `#[serde(...)]` and mentions one of the skip flags.
fn is_serde_skip(attr: &syn::Attribute) -> bool {
	let Meta::List(ref list) = attr.meta else {
		return false;
	};

	if !list.path.is_ident("serde") {
		return false;
	}

	list.tokens.to_token_stream().into_iter().any(|token| {
		matches!(token, TokenTree::Ident(ref ident) if ident == "skip_deserializing" || ident == "skip")
	})
}

pub fn from_input(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
	let input = syn::parse_macro_input!(input as syn::DeriveInput);
	let receiver = match ModelInputReceiver::from_derive_input(&input) {
		Ok(x) => x,
		Err(e) => return e.write_errors().into(),
	};

	let ident = &receiver.ident;
	let vis = &input.vis;
	let generics = &receiver.generics;
	let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
	let form_ident = format_ident!("{}Form", ident);
	let form_doc = format!("Submitted form fields of [`{ident}`].");

	// Docs belong to the model, not the form
	let attrs = receiver
		.attrs
		.iter()
		.filter(|attr| !attr.path().is_ident("doc"))
		.collect::<Vec<_>>();

	let Some(fields) = receiver.data.take_struct() else {
		return syn::Error::new_spanned(ident, "expected a struct with named fields")
			.into_compile_error()
			.into();
	};

	let fields = fields
		.iter()
		.filter_map(|field| {
			let ident = field.ident.as_ref()?;

			if field.attrs.iter().any(is_serde_skip) {
				return None;
			}

			let attrs = field
				.attrs
				.iter()
				.filter(|attr| !attr.path().is_ident("sqlx"))
				.collect::<Vec<_>>();

			Some((attrs, ident, &field.ty, &field.vis))
		})
		.collect::<Vec<_>>();

	let form_fields = fields.iter().map(|(attrs, ident, ty, vis)| {
		quote! {
			#(#attrs)*
			#vis #ident: #ty,
		}
	});

	let field_idents = fields.iter().map(|(_, ident, ..)| ident);

	quote! {
		#input

		#[doc = #form_doc]
		#(#attrs)*
		#vis struct #form_ident #generics {
			#(
				#form_fields
			)*
		}

		impl #impl_generics ::core::convert::From<&#ident #ty_generics> for #form_ident #ty_generics #where_clause {
			fn from(model: &#ident #ty_generics) -> Self {
				Self {
					#(
						#field_idents: ::core::clone::Clone::clone(&model.#field_idents),
					)*
				}
			}
		}
	}
	.into()
}
