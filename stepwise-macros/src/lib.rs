mod error_set;

use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, Error, ItemFn, parse_macro_input};

/// Derives `stepwise::ErrorSet` for an enum of declared error kinds.
///
/// Every variant wraps exactly one error type. Exactly one variant is marked
/// `#[fallback]` and wraps `stepwise::Error`; failures matching no declared
/// kind land there.
#[proc_macro_derive(ErrorSet, attributes(fallback))]
pub fn derive_error_set(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    error_set::expand(&input)
        .unwrap_or_else(Error::into_compile_error)
        .into()
}

/// Runs an `async fn` test as a task on a fresh scheduler.
///
/// The body may return `()` or `Result<(), E>`; an `Err` or a panic fails
/// the test.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);

    if !attr.is_empty() {
        return Error::new(
            proc_macro2::Span::call_site(),
            "#[stepwise::test] takes no arguments",
        )
        .to_compile_error()
        .into();
    }

    let attrs = &input.attrs;
    let vis = &input.vis;
    let sig = &input.sig;
    let block = &input.block;

    if sig.asyncness.is_none() {
        return Error::new_spanned(
            sig.fn_token,
            "#[stepwise::test] must be used on an async function",
        )
        .to_compile_error()
        .into();
    }

    if !sig.inputs.is_empty() {
        return Error::new_spanned(&sig.inputs, "#[stepwise::test] functions take no arguments")
            .to_compile_error()
            .into();
    }

    let name = &sig.ident;
    let output = &sig.output;

    quote! {
        #[::core::prelude::v1::test]
        #(#attrs)*
        #vis fn #name() {
            async fn body() #output #block

            ::stepwise::__private::run_test(body())
        }
    }
    .into()
}
