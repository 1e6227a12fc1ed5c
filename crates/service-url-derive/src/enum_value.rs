//! `EnumValue` derive macro implementation.

use proc_macro::TokenStream;
use quote::{quote, quote_spanned};
use syn::DeriveInput;

use crate::utils::EnumContainer;

impl EnumContainer {
    fn derive_enum_value(&self) -> proc_macro2::TokenStream {
        let name = &self.name;
        let cr = self.cr(name.span());

        let names = self.variants.iter().map(|variant| variant.canonical_name());
        let aliases = self.variants.iter().enumerate().flat_map(|(i, variant)| {
            variant
                .attrs
                .aliases
                .iter()
                .map(move |alias| quote_spanned!(alias.span()=> (#alias, #i)))
        });
        let maybe_case_sensitive = self.attrs.case_sensitive.then(|| quote!(.case_sensitive()));

        let ordinal_arms = self.variants.iter().enumerate().map(|(i, variant)| {
            let variant_name = &variant.name;
            quote_spanned!(variant_name.span()=> Self::#variant_name => #i,)
        });
        let from_ordinal_arms = self.variants.iter().enumerate().map(|(i, variant)| {
            let variant_name = &variant.name;
            quote_spanned! {variant_name.span()=>
                #i => ::core::option::Option::Some(Self::#variant_name),
            }
        });

        quote! {
            impl #cr::value::EnumValue for #name {
                const FORMATTER: &'static #cr::metadata::EnumFormatter =
                    &#cr::metadata::EnumFormatter::new(&[#(#names,)*])
                        .with_aliases(&[#(#aliases,)*])
                        #maybe_case_sensitive;

                fn ordinal(&self) -> usize {
                    match *self {
                        #(#ordinal_arms)*
                    }
                }

                fn from_ordinal(ordinal: usize) -> ::core::option::Option<Self> {
                    match ordinal {
                        #(#from_ordinal_arms)*
                        _ => ::core::option::Option::None,
                    }
                }
            }

            impl #cr::value::UrlValue for #name {
                const KIND: #cr::metadata::SemanticKind = #cr::metadata::SemanticKind::Enum(
                    <Self as #cr::value::EnumValue>::FORMATTER,
                );

                fn to_value(&self) -> ::core::result::Result<#cr::value::Value, #cr::ValueError> {
                    #cr::value::_private::enum_to_value(self)
                }

                fn from_value(
                    value: #cr::value::Value,
                ) -> ::core::result::Result<Self, #cr::ValueError> {
                    #cr::value::_private::enum_from_value(value)
                }
            }
        }
    }
}

pub(crate) fn impl_enum_value(input: TokenStream) -> TokenStream {
    let input: DeriveInput = match syn::parse(input) {
        Ok(input) => input,
        Err(err) => return err.into_compile_error().into(),
    };
    let trait_impl = match EnumContainer::new(&input) {
        Ok(trait_impl) => trait_impl,
        Err(err) => return err.into_compile_error().into(),
    };
    trait_impl.derive_enum_value().into()
}
