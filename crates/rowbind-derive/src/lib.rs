//! Derive macro for `rowbind::Record`.
//!
//! Each field annotated with `#[csv("<index>,<name>[,<format>]")]` becomes a
//! column binding; `#[csv(flatten)]` splices the fields of an embedded record.
//! Fields without a `csv` attribute are left out of the row.
//!
//! ```ignore
//! #[derive(Default, rowbind::Record)]
//! struct Event {
//!     #[csv("0,id")]
//!     id: u32,
//!     #[csv("1,at,%Y-%m-%d")]
//!     at: chrono::NaiveDate,
//!     #[csv(flatten)]
//!     source: Source,
//!     cached: Option<String>,
//! }
//! ```

use proc_macro::TokenStream;
use quote::quote;
use syn::parse::ParseStream;
use syn::{
    Data, DeriveInput, Error, Fields, Ident, LitStr, Member, parse_macro_input, spanned::Spanned,
};

/// Implement `rowbind::Record` from `#[csv(...)]` field attributes.
///
/// Only non-generic structs are supported. Field declaration order is the
/// column order used when encoding.
#[proc_macro_derive(Record, attributes(csv))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_record(&input)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}

/// How one field takes part in the row
enum Binding {
    Column(LitStr),
    Flatten,
}

fn expand_record(input: &DeriveInput) -> Result<proc_macro2::TokenStream, Error> {
    if !input.generics.params.is_empty() {
        return Err(Error::new(
            input.generics.span(),
            "#[derive(Record)] does not support generic types",
        ));
    }

    let Data::Struct(data) = &input.data else {
        return Err(Error::new(
            input.ident.span(),
            "#[derive(Record)] only supports structs",
        ));
    };

    let members: Vec<(Member, &syn::Field)> = match &data.fields {
        Fields::Named(named) => named
            .named
            .iter()
            .filter_map(|field| field.ident.clone().map(|ident| (Member::Named(ident), field)))
            .collect(),
        Fields::Unnamed(unnamed) => unnamed
            .unnamed
            .iter()
            .enumerate()
            .map(|(index, field)| (Member::from(index), field))
            .collect(),
        Fields::Unit => Vec::new(),
    };

    let mut calls = Vec::new();
    for (member, field) in &members {
        let Some(binding) = field_binding(field)? else {
            continue;
        };

        let name = member_name(member);
        let ty = &field.ty;
        let call = match binding {
            Binding::Column(tag) => quote! {
                schema.field::<#ty>(
                    #name,
                    #tag,
                    |record| &record.#member,
                    |record| &mut record.#member,
                );
            },
            Binding::Flatten => quote! {
                schema.flatten::<#ty>(
                    #name,
                    |record| &record.#member,
                    |record| &mut record.#member,
                );
            },
        };
        calls.push(call);
    }

    let ident = &input.ident;
    let schema_ident = if calls.is_empty() {
        quote!(_schema)
    } else {
        quote!(schema)
    };

    Ok(quote! {
        impl ::rowbind::Record for #ident {
            fn describe(#schema_ident: &mut ::rowbind::SchemaBuilder<Self>) {
                #(#calls)*
            }
        }
    })
}

fn field_binding(field: &syn::Field) -> Result<Option<Binding>, Error> {
    let mut binding = None;

    for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("csv")) {
        if binding.is_some() {
            return Err(Error::new(attr.span(), "duplicate #[csv] attribute"));
        }

        binding = Some(attr.parse_args_with(|input: ParseStream| {
            if input.peek(LitStr) {
                return input.parse::<LitStr>().map(Binding::Column);
            }

            let ident: Ident = input.parse()?;
            if ident == "flatten" {
                Ok(Binding::Flatten)
            } else {
                Err(Error::new(
                    ident.span(),
                    "expected a tag string like \"0,name\" or `flatten`",
                ))
            }
        })?);
    }

    Ok(binding)
}

fn member_name(member: &Member) -> String {
    match member {
        Member::Named(ident) => {
            let name = ident.to_string();
            name.strip_prefix("r#").map_or_else(|| name.clone(), str::to_string)
        }
        Member::Unnamed(index) => index.index.to_string(),
    }
}
