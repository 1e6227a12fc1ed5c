//! `DescribeConfig` derive macro implementation.

use proc_macro::TokenStream;
use quote::{quote, quote_spanned};
use syn::{DeriveInput, spanned::Spanned};

use crate::utils::{ConfigContainer, ConfigField, wrap_in_option};

impl ConfigField {
    fn validate_keys(&self, parent: &ConfigContainer) -> proc_macro2::TokenStream {
        // Only explicitly specified keys are validated here, so that errors point to the attribute.
        let explicit_keys = self.attrs.key.iter().chain(&self.attrs.aliases);
        let validations = explicit_keys.map(|key| {
            let cr = parent.cr(key.span());
            quote_spanned! {key.span()=>
                const _: () = #cr::metadata::_private::assert_key(#key);
            }
        });
        quote!(#(#validations)*)
    }

    fn describe_field(&self, parent: &ConfigContainer) -> proc_macro2::TokenStream {
        let name_span = self.name_span();
        let cr = parent.cr(name_span);
        let name = self.rust_name();
        let help = &self.docs;
        let keys = self.keys();

        let ty = &self.ty;
        let ty_in_code = if let Some(text) = ty.span().source_text() {
            quote!(#text)
        } else {
            quote!(::core::stringify!(#ty))
        };

        let url_part = self.url_slot().to_tokens(&cr);
        let default_value = wrap_in_option(self.attrs.default.as_ref().map(|lit| quote!(#lit)));
        let required = self.attrs.required;
        let separator = match &self.attrs.sep {
            Some(sep) => quote!(#sep),
            None => quote!(','),
        };

        quote_spanned! {name_span=>
            #cr::metadata::FieldMetadata {
                name: #name,
                keys: &[#(#keys,)*],
                help: #help,
                rust_type: #cr::metadata::RustType::of::<#ty>(#ty_in_code),
                kind: <#ty as #cr::value::UrlValue>::KIND,
                url_part: #url_part,
                default_value: #default_value,
                required: #required,
                is_secret: <#ty as #cr::value::UrlValue>::SECRET,
                separator: #separator,
            }
        }
    }
}

impl ConfigContainer {
    fn derive_describe_config(&self) -> proc_macro2::TokenStream {
        let name = &self.name;
        let cr = self.cr(name.span());
        let name_str = name.to_string();
        let help = &self.help;
        let scheme = wrap_in_option(self.attrs.scheme.as_ref().map(|lit| quote!(#lit)));
        let force_query = self.attrs.force_query;

        let fields = self.visible_fields().map(|field| field.describe_field(self));
        let validations = self.visible_fields().map(|field| field.validate_keys(self));

        quote! {
            impl #cr::DescribeConfig for #name {
                const DESCRIPTION: #cr::metadata::ConfigMetadata = {
                    const FIELDS: &[#cr::metadata::FieldMetadata] = &[#(#fields,)*];

                    #cr::metadata::ConfigMetadata {
                        ty: #cr::metadata::RustType::of::<#name>(#name_str),
                        help: #help,
                        scheme: #scheme,
                        force_query: #force_query,
                        fields: FIELDS,
                    }
                };
            }

            #(#validations)*
            const _: () = <#name as #cr::DescribeConfig>::DESCRIPTION.assert_valid();
        }
    }

    fn derive_access_config(&self) -> proc_macro2::TokenStream {
        let name = &self.name;
        let cr = self.cr(name.span());

        let read_arms = self.visible_fields().enumerate().map(|(i, field)| {
            let field_name = &field.name;
            quote_spanned! {field.name_span()=>
                #i => #cr::value::UrlValue::to_value(&self.#field_name),
            }
        });
        let write_arms = self.visible_fields().enumerate().map(|(i, field)| {
            let field_name = &field.name;
            let ty = &field.ty;
            quote_spanned! {field.name_span()=>
                #i => {
                    self.#field_name = <#ty as #cr::value::UrlValue>::from_value(value)?;
                    ::core::result::Result::Ok(())
                }
            }
        });

        quote! {
            impl #cr::AccessConfig for #name {
                fn read_field(
                    &self,
                    index: usize,
                ) -> ::core::result::Result<#cr::value::Value, #cr::ValueError> {
                    match index {
                        #(#read_arms)*
                        _ => ::core::panic!("field index {index} is out of bounds"),
                    }
                }

                fn write_field(
                    &mut self,
                    index: usize,
                    value: #cr::value::Value,
                ) -> ::core::result::Result<(), #cr::ValueError> {
                    match index {
                        #(#write_arms)*
                        _ => {
                            ::core::mem::drop(value);
                            ::core::panic!("field index {index} is out of bounds")
                        }
                    }
                }
            }
        }
    }

    fn derive_all(&self) -> proc_macro2::TokenStream {
        let access_impl = self.derive_access_config();
        let describe_impl = self.derive_describe_config();
        quote!(#access_impl #describe_impl)
    }
}

pub(crate) fn impl_describe_config(input: TokenStream) -> TokenStream {
    let input: DeriveInput = match syn::parse(input) {
        Ok(input) => input,
        Err(err) => return err.into_compile_error().into(),
    };
    let trait_impl = match ConfigContainer::new(&input) {
        Ok(trait_impl) => trait_impl,
        Err(err) => return err.into_compile_error().into(),
    };
    trait_impl.derive_all().into()
}
