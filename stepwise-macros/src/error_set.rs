use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Error, Fields, Ident, Type};

/// A variant wrapping one error kind.
struct Kind<'a> {
    ident: &'a Ident,
    ty: &'a Type,
}

/// Generates the `ErrorSet` impl for `input`.
pub(crate) fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let Data::Enum(data) = &input.data else {
        return Err(Error::new_spanned(
            &input.ident,
            "ErrorSet can only be derived for enums",
        ));
    };

    let mut declared = Vec::new();
    let mut fallback: Option<Kind> = None;

    for variant in &data.variants {
        let ty = match &variant.fields {
            Fields::Unnamed(fields) if fields.unnamed.len() == 1 => &fields.unnamed[0].ty,
            _ => {
                return Err(Error::new_spanned(
                    variant,
                    "ErrorSet variants must wrap exactly one error type",
                ));
            }
        };

        let kind = Kind {
            ident: &variant.ident,
            ty,
        };

        if variant.attrs.iter().any(|attr| attr.path().is_ident("fallback")) {
            if fallback.is_some() {
                return Err(Error::new_spanned(
                    variant,
                    "only one variant may be marked #[fallback]",
                ));
            }
            fallback = Some(kind);
        } else {
            declared.push(kind);
        }
    }

    let Some(fallback) = fallback else {
        return Err(Error::new_spanned(
            &input.ident,
            "ErrorSet needs one #[fallback] variant wrapping stepwise::Error",
        ));
    };

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let fallback_ident = fallback.ident;

    let matchers = declared.iter().map(|Kind { ident, ty }| {
        quote! {
            let failure = match failure.downcast::<#ty>() {
                ::core::result::Result::Ok(kind) => return Self::#ident(*kind),
                ::core::result::Result::Err(failure) => failure,
            };
        }
    });

    Ok(quote! {
        impl #impl_generics ::stepwise::ErrorSet for #name #ty_generics #where_clause {
            fn classify(failure: ::stepwise::Failure) -> Self {
                let failure = match failure.downcast::<Self>() {
                    ::core::result::Result::Ok(kind) => return *kind,
                    ::core::result::Result::Err(failure) => failure,
                };

                #(#matchers)*

                Self::#fallback_ident(::stepwise::Error::from_failure(failure))
            }

            fn fallback(error: ::stepwise::Error) -> Self {
                Self::#fallback_ident(error)
            }

            fn is_fallback(&self) -> bool {
                ::core::matches!(self, Self::#fallback_ident(..))
            }
        }
    })
}
