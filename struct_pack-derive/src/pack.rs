use {
    crate::common::{Field, FieldsExt, SchemaArgs, Variant},
    darling::{
        ast::{Data, Fields, Style},
        Result,
    },
    proc_macro2::TokenStream,
    quote::quote,
    syn::{parse_quote, DeriveInput, Path},
};

struct Body {
    type_meta: TokenStream,
    varint_sensitive: TokenStream,
    describe: TokenStream,
    visit: TokenStream,
}

fn impl_struct(crate_name: &Path, fields: &Fields<Field>, fixed_layout: bool) -> Body {
    let types = fields.types();
    let members = fields.members();

    if !fixed_layout {
        return Body {
            type_meta: quote! {
                #crate_name::TypeMeta::Static { size: 0, trivial: false }
                    #(.then(<#types as #crate_name::Pack>::TYPE_META))*
            },
            varint_sensitive: quote! {},
            describe: quote! {
                __d.code(#crate_name::signature::code::STRUCT);
                #( __d.describe::<#types>(); )*
                __d.code(#crate_name::signature::code::END);
            },
            visit: quote! {
                #( <#types as #crate_name::Pack>::visit(&self.#members, __v)?; )*
                Ok(())
            },
        };
    }

    // Fields encode as their in-memory bytes, so the padding between them follows the
    // `#[repr(C)]` offsets, and the struct is trivial when it has no padding at all.
    Body {
        type_meta: quote! {{
            let mut trivial = true;
            let mut unpadded = 0usize;
            #(
                match <#types as #crate_name::Pack>::TYPE_META {
                    #crate_name::TypeMeta::Static { size, trivial: field_trivial }
                        if size == ::core::mem::size_of::<#types>() =>
                    {
                        trivial = trivial && field_trivial;
                        unpadded += size;
                    }
                    _ => panic!("`fixed_layout` fields must encode as their in-memory bytes"),
                }
            )*
            #crate_name::TypeMeta::Static {
                size: ::core::mem::size_of::<Self>(),
                trivial: trivial && unpadded == ::core::mem::size_of::<Self>(),
            }
        }},
        varint_sensitive: quote! {
            const VARINT_SENSITIVE: bool =
                false #(|| <#types as #crate_name::Pack>::VARINT_SENSITIVE)*;
        },
        describe: quote! {
            __d.code(#crate_name::signature::code::STRUCT);
            #( __d.describe::<#types>(); )*
            __d.size_literal(::core::mem::align_of::<Self>());
            __d.size_literal(::core::mem::align_of::<Self>());
            __d.code(#crate_name::signature::code::END);
        },
        visit: quote! {
            let _ = <Self as #crate_name::Pack>::TYPE_META;
            let mut __end = 0usize;
            #(
                __v.padding(::core::mem::offset_of!(Self, #members) - __end)?;
                <#types as #crate_name::Pack>::visit(&self.#members, __v)?;
                __end = ::core::mem::offset_of!(Self, #members) + ::core::mem::size_of::<#types>();
            )*
            __v.padding(::core::mem::size_of::<Self>() - __end)
        },
    }
}

/// Literal of one alternative: unit variants are a monostate, single-field tuple variants are
/// their field, every other shape is an anonymous struct.
fn describe_variant(crate_name: &Path, fields: &Fields<Field>) -> TokenStream {
    let types = fields.types();
    match (fields.style, types.as_slice()) {
        (Style::Unit, _) => quote! { __d.code(#crate_name::signature::code::MONOSTATE); },
        (Style::Tuple, [ty]) => quote! { __d.describe::<#ty>(); },
        _ => quote! {
            __d.code(#crate_name::signature::code::STRUCT);
            #( __d.describe::<#types>(); )*
            __d.code(#crate_name::signature::code::END);
        },
    }
}

/// Pattern matching `Self::Variant` with its fields bound to `__f0`, `__f1`, ...
pub(crate) fn variant_pattern(variant: &Variant) -> TokenStream {
    let ident = &variant.ident;
    let members = variant.fields.members();
    let bindings = variant.fields.bindings();
    quote! { Self::#ident { #(#members: #bindings),* } }
}

fn impl_enum(crate_name: &Path, variants: &[Variant]) -> Body {
    let describe_variants = variants
        .iter()
        .map(|variant| describe_variant(crate_name, &variant.fields));

    let visit_arms = variants.iter().enumerate().map(|(i, variant)| {
        let pattern = variant_pattern(variant);
        let index = i as u8;
        let types = variant.fields.types();
        let bindings = variant.fields.bindings();
        quote! {
            #pattern => {
                __v.tag(#index)?;
                #( <#types as #crate_name::Pack>::visit(#bindings, __v)?; )*
                Ok(())
            }
        }
    });

    Body {
        type_meta: quote! { #crate_name::TypeMeta::Dynamic },
        varint_sensitive: quote! {},
        describe: quote! {
            __d.code(#crate_name::signature::code::VARIANT);
            #(#describe_variants)*
            __d.code(#crate_name::signature::code::END);
        },
        visit: quote! {
            match self {
                #(#visit_arms)*
            }
        },
    }
}

pub(crate) fn generate(input: DeriveInput) -> Result<TokenStream> {
    let args = SchemaArgs::parse(&input, "Pack")?;
    let crate_name = args.crate_name();
    let generics = args.bounded_generics(&parse_quote!(#crate_name::Pack));
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    let ident = &args.ident;

    let Body {
        type_meta,
        varint_sensitive,
        describe,
        visit,
    } = match &args.data {
        Data::Struct(fields) => impl_struct(&crate_name, fields, args.fixed_layout),
        Data::Enum(variants) => impl_enum(&crate_name, variants),
    };
    let polymorphic_id = args.id.map(|id| {
        quote! {
            const POLYMORPHIC_ID: ::core::option::Option<u32> =
                ::core::option::Option::Some(#id);
        }
    });

    Ok(quote! {
        // SAFETY: the size and triviality are derived from the fields in encoding order.
        unsafe impl #impl_generics #crate_name::Pack for #ident #ty_generics #where_clause {
            #[allow(clippy::arithmetic_side_effects)]
            const TYPE_META: #crate_name::TypeMeta = #type_meta;

            #varint_sensitive

            #polymorphic_id

            #[inline]
            fn describe(__d: &mut #crate_name::signature::Describe) {
                #describe
            }

            #[inline]
            #[allow(unused_variables)]
            fn visit<__V: #crate_name::Visitor>(
                &self,
                __v: &mut __V,
            ) -> ::core::result::Result<(), __V::Error> {
                #visit
            }
        }
    })
}
