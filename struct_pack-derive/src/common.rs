use {
    darling::{
        ast::{Data, Fields},
        Error, FromDeriveInput, FromField, FromVariant, Result,
    },
    proc_macro2::TokenStream,
    quote::format_ident,
    syn::{parse_quote, DeriveInput, Generics, Ident, Member, Path, Type},
};

#[derive(FromField)]
#[darling(attributes(struct_pack))]
pub(crate) struct Field {
    pub(crate) ident: Option<Ident>,
    pub(crate) ty: Type,
}

impl Field {
    /// Member used to access the field on `self`, `0`, `1`, ... for tuple structs.
    pub(crate) fn member(&self, index: usize) -> Member {
        match &self.ident {
            Some(ident) => ident.clone().into(),
            None => index.into(),
        }
    }
}

pub(crate) trait FieldsExt {
    fn members(&self) -> Vec<Member>;

    fn types(&self) -> Vec<&Type>;

    /// Local bindings `__f0`, `__f1`, ... used when destructuring enum variants.
    fn bindings(&self) -> Vec<Ident>;
}

impl FieldsExt for Fields<Field> {
    fn members(&self) -> Vec<Member> {
        self.iter()
            .enumerate()
            .map(|(i, field)| field.member(i))
            .collect()
    }

    fn types(&self) -> Vec<&Type> {
        self.iter().map(|field| &field.ty).collect()
    }

    fn bindings(&self) -> Vec<Ident> {
        (0..self.len()).map(|i| format_ident!("__f{i}")).collect()
    }
}

#[derive(FromVariant)]
#[darling(attributes(struct_pack))]
pub(crate) struct Variant {
    pub(crate) ident: Ident,
    pub(crate) fields: Fields<Field>,
}

pub(crate) type ImplBody = Data<Variant, Field>;

#[derive(FromDeriveInput)]
#[darling(attributes(struct_pack), supports(struct_any, enum_any))]
pub(crate) struct SchemaArgs {
    pub(crate) ident: Ident,
    pub(crate) generics: Generics,
    pub(crate) data: ImplBody,

    /// Used to determine the `struct_pack` path.
    ///
    /// If `internal` is `true`, the generated code will use the `crate::` path.
    #[darling(default)]
    pub(crate) internal: bool,
    /// Encode the struct with the explicit zero padding of its `#[repr(C)]` layout.
    #[darling(default)]
    pub(crate) fixed_layout: bool,
    /// Registry id when the type sits behind a `PolyBox`, instead of its type code.
    #[darling(default)]
    pub(crate) id: Option<u32>,
}

impl SchemaArgs {
    /// Parse the derive input, rejecting layouts the generated code cannot handle.
    pub(crate) fn parse(input: &DeriveInput, trait_name: &str) -> Result<Self> {
        ensure_not_repr_packed(input, trait_name)?;
        let args = Self::from_derive_input(input)?;
        if args.fixed_layout {
            if !matches!(args.data, Data::Struct(_)) {
                return Err(
                    Error::custom("`fixed_layout` is only supported for structs")
                        .with_span(&input.ident),
                );
            }
            if !has_repr_c(input)? {
                return Err(
                    Error::custom("`fixed_layout` requires `#[repr(C)]`").with_span(&input.ident),
                );
            }
        }
        if let Data::Enum(variants) = &args.data {
            if variants.is_empty() {
                return Err(Error::custom(format!(
                    "`{trait_name}` cannot be derived for enums without variants"
                ))
                .with_span(&input.ident));
            }
            if variants.len() > u8::MAX as usize {
                return Err(Error::custom(format!(
                    "`{trait_name}` supports at most 255 variants, found {}",
                    variants.len()
                ))
                .with_span(&input.ident));
            }
        }
        Ok(args)
    }

    /// Path to `struct_pack` based on the `internal` flag.
    pub(crate) fn crate_name(&self) -> Path {
        if self.internal {
            parse_quote!(crate)
        } else {
            parse_quote!(::struct_pack)
        }
    }

    /// The type's generics with `bound` added to every type parameter.
    pub(crate) fn bounded_generics(&self, bound: &Path) -> Generics {
        let mut generics = self.generics.clone();
        for param in generics.type_params_mut() {
            param.bounds.push(parse_quote!(#bound));
        }
        generics
    }
}

/// Reject deriving on `#[repr(packed)]` types, as field references into them are unaligned.
fn ensure_not_repr_packed(input: &DeriveInput, trait_name: &str) -> Result<()> {
    for attr in &input.attrs {
        if !attr.path().is_ident("repr") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("packed") {
                return Err(meta.error(format!(
                    "`{trait_name}` cannot be derived for types annotated with `#[repr(packed)]` \
                     or `#[repr(packed(n))]`"
                )));
            }

            // Parse left over input for `align(n)`
            let _ = meta.input.parse::<TokenStream>();

            Ok(())
        })?;
    }
    Ok(())
}

fn has_repr_c(input: &DeriveInput) -> Result<bool> {
    let mut repr_c = false;
    for attr in &input.attrs {
        if !attr.path().is_ident("repr") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("C") {
                repr_c = true;
            }
            let _ = meta.input.parse::<TokenStream>();
            Ok(())
        })?;
    }
    Ok(repr_c)
}
