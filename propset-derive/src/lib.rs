use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Member, parse_macro_input};

#[derive(Default)]
struct Capabilities {
    name_aware: bool,
    owner_aware: bool,
}

/// Implements `propset::property::DynProperty` for a type.
///
/// A field marked `#[property(base)]` (usually a `propset::Property`) receives
/// the injected name and owner: `NameAware` and `OwnerAware` are delegated to
/// it. Types implementing the capabilities by hand declare them with
/// `#[property(name_aware)]` and/or `#[property(owner_aware)]` on the type.
/// Without either, the type is a plain property that receives nothing.
///
/// ```ignore
/// #[derive(Default, Property)]
/// pub struct IntColumn {
///     #[property(base)]
///     base: Property,
///     pub required: bool,
/// }
/// ```
#[proc_macro_derive(Property, attributes(property))]
pub fn derive_property(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let capabilities = container_capabilities(&input.attrs)?;
    let base = base_member(input)?;

    let mut delegated = quote! {};
    if let Some(base) = &base {
        if capabilities.name_aware || capabilities.owner_aware {
            return Err(syn::Error::new_spanned(
                name,
                "a `#[property(base)]` field already provides `name_aware` and `owner_aware`",
            ));
        }

        delegated = quote! {
            impl #impl_generics ::propset::property::NameAware for #name #ty_generics #where_clause {
                fn property_name(&self) -> ::core::option::Option<&str> {
                    ::propset::property::NameAware::property_name(&self.#base)
                }

                fn set_property_name(&mut self, name: ::std::string::String) {
                    ::propset::property::NameAware::set_property_name(&mut self.#base, name)
                }
            }

            impl #impl_generics ::propset::property::OwnerAware for #name #ty_generics #where_clause {
                fn property_owner(&self) -> ::core::option::Option<&::propset::property::OwnerRef> {
                    ::propset::property::OwnerAware::property_owner(&self.#base)
                }

                fn set_property_owner(&mut self, owner: ::propset::property::OwnerRef) {
                    ::propset::property::OwnerAware::set_property_owner(&mut self.#base, owner)
                }
            }
        };
    }

    let mut probes = Vec::new();
    if base.is_some() || capabilities.name_aware {
        probes.push(quote! {
            fn as_name_aware(&self) -> ::core::option::Option<&dyn ::propset::property::NameAware> {
                ::core::option::Option::Some(self)
            }

            fn as_name_aware_mut(
                &mut self,
            ) -> ::core::option::Option<&mut dyn ::propset::property::NameAware> {
                ::core::option::Option::Some(self)
            }
        });
    }
    if base.is_some() || capabilities.owner_aware {
        probes.push(quote! {
            fn as_owner_aware(&self) -> ::core::option::Option<&dyn ::propset::property::OwnerAware> {
                ::core::option::Option::Some(self)
            }

            fn as_owner_aware_mut(
                &mut self,
            ) -> ::core::option::Option<&mut dyn ::propset::property::OwnerAware> {
                ::core::option::Option::Some(self)
            }
        });
    }

    Ok(quote! {
        #delegated

        impl #impl_generics ::propset::property::DynProperty for #name #ty_generics #where_clause {
            #(#probes)*
        }
    })
}

fn property_attributes(attrs: &[Attribute]) -> impl Iterator<Item = &Attribute> {
    attrs.iter().filter(|attr| attr.path().is_ident("property"))
}

fn container_capabilities(attrs: &[Attribute]) -> syn::Result<Capabilities> {
    let mut capabilities = Capabilities::default();
    for attr in property_attributes(attrs) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name_aware") {
                capabilities.name_aware = true;
                Ok(())
            } else if meta.path.is_ident("owner_aware") {
                capabilities.owner_aware = true;
                Ok(())
            } else {
                Err(meta.error("expected `name_aware` or `owner_aware`"))
            }
        })?;
    }
    Ok(capabilities)
}

/// Field marked `#[property(base)]`, if any.
fn base_member(input: &DeriveInput) -> syn::Result<Option<Member>> {
    let Data::Struct(data) = &input.data else {
        return Ok(None);
    };

    let mut found = None;
    for (index, field) in data.fields.iter().enumerate() {
        let mut is_base = false;
        for attr in property_attributes(&field.attrs) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("base") {
                    is_base = true;
                    Ok(())
                } else {
                    Err(meta.error("expected `base`"))
                }
            })?;
        }

        if !is_base {
            continue;
        }
        if found.is_some() {
            return Err(syn::Error::new_spanned(
                field,
                "only one field can be marked `#[property(base)]`",
            ));
        }
        found = Some(match &field.ident {
            Some(ident) => Member::Named(ident.clone()),
            None => Member::Unnamed(index.into()),
        });
    }

    Ok(found)
}
