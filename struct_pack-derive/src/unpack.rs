use {
    crate::{
        common::{Field, FieldsExt, SchemaArgs, Variant},
        pack::variant_pattern,
    },
    darling::{
        ast::{Data, Fields},
        Result,
    },
    proc_macro2::TokenStream,
    quote::quote,
    syn::{parse_quote, DeriveInput, Generics, Ident, Path},
};

fn unpack_struct(crate_name: &Path, fields: &Fields<Field>, fixed_layout: bool) -> TokenStream {
    let types = fields.types();
    let members = fields.members();

    if !fixed_layout {
        return quote! {
            Ok(Self { #( #members: <#types as #crate_name::Unpack>::unpack(__u)? ),* })
        };
    }

    let bindings = fields.bindings();
    quote! {
        let _ = <Self as #crate_name::Pack>::TYPE_META;
        let mut __end = 0usize;
        #(
            __u.skip_padding(::core::mem::offset_of!(Self, #members) - __end)?;
            let #bindings = <#types as #crate_name::Unpack>::unpack(__u)?;
            __end = ::core::mem::offset_of!(Self, #members) + ::core::mem::size_of::<#types>();
        )*
        __u.skip_padding(::core::mem::size_of::<Self>() - __end)?;
        Ok(Self { #( #members: #bindings ),* })
    }
}

fn unpack_compatible_struct(crate_name: &Path, fields: &Fields<Field>) -> TokenStream {
    let types = fields.types();
    let members = fields.members();
    quote! {
        #( <#types as #crate_name::Unpack>::unpack_compatible(&mut self.#members, __u, __version)?; )*
        Ok(())
    }
}

fn unpack_enum(crate_name: &Path, variants: &[Variant]) -> TokenStream {
    let arms = variants.iter().enumerate().map(|(i, variant)| {
        let index = i as u8;
        let ident = &variant.ident;
        let types = variant.fields.types();
        let members = variant.fields.members();
        quote! {
            #index => Ok(Self::#ident {
                #( #members: <#types as #crate_name::Unpack>::unpack(__u)? ),*
            }),
        }
    });
    quote! {
        match __u.read_tag()? {
            #(#arms)*
            tag => Err(#crate_name::error::invalid_tag_encoding(tag as usize)),
        }
    }
}

fn unpack_compatible_enum(crate_name: &Path, variants: &[Variant]) -> TokenStream {
    let arms = variants.iter().map(|variant| {
        let pattern = variant_pattern(variant);
        let types = variant.fields.types();
        let bindings = variant.fields.bindings();
        quote! {
            #pattern => {
                #( <#types as #crate_name::Unpack>::unpack_compatible(#bindings, __u, __version)?; )*
            }
        }
    });
    quote! {
        match self {
            #(#arms)*
        }
        Ok(())
    }
}

/// `FieldAt<I>` for every field of a struct.
fn field_at(
    crate_name: &Path,
    ident: &Ident,
    generics: &Generics,
    fields: &Fields<Field>,
) -> TokenStream {
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    let impls = fields
        .iter()
        .zip(fields.members())
        .enumerate()
        .map(|(i, (field, member))| {
            let ty = &field.ty;
            quote! {
                impl #impl_generics #crate_name::FieldAt<#i> for #ident #ty_generics #where_clause {
                    type Type = #ty;

                    #[inline]
                    fn into_field(self) -> Self::Type {
                        self.#member
                    }
                }
            }
        });
    quote! { #(#impls)* }
}

pub(crate) fn generate(input: DeriveInput) -> Result<TokenStream> {
    let args = SchemaArgs::parse(&input, "Unpack")?;
    let crate_name = args.crate_name();
    let generics = args.bounded_generics(&parse_quote!(#crate_name::Unpack));
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    let ident = &args.ident;

    let (unpack, unpack_compatible, field_impls) = match &args.data {
        Data::Struct(fields) => (
            unpack_struct(&crate_name, fields, args.fixed_layout),
            unpack_compatible_struct(&crate_name, fields),
            field_at(&crate_name, ident, &generics, fields),
        ),
        Data::Enum(variants) => (
            unpack_enum(&crate_name, variants),
            unpack_compatible_enum(&crate_name, variants),
            quote! {},
        ),
    };

    Ok(quote! {
        impl #impl_generics #crate_name::Unpack for #ident #ty_generics #where_clause {
            #[inline]
            #[allow(unused_variables)]
            fn unpack(
                __u: &mut #crate_name::unpack::Unpacker<'_>,
            ) -> #crate_name::ReadResult<Self> {
                #unpack
            }

            #[inline]
            #[allow(unused_variables)]
            fn unpack_compatible(
                &mut self,
                __u: &mut #crate_name::unpack::Unpacker<'_>,
                __version: u64,
            ) -> #crate_name::ReadResult<()> {
                #unpack_compatible
            }
        }

        #field_impls
    })
}
