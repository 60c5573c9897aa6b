use {
    core::str,
    proc_macro2::{Ident, Literal, Span},
    quote::quote,
    std::io::{Result, Write},
};

/// Generate `Pack` and `Unpack` implementations for tuples up to the given arity.
#[allow(clippy::arithmetic_side_effects)]
pub fn generate(arity: usize, mut out: impl Write) -> Result<()> {
    // Avoid single item tuples and avoid running out of alphabet.
    assert!(arity > 1 && arity <= 26, "arity must be > 1 and <= 26");

    for arity in 2..=arity {
        let mut alpha = ('A'..='Z').cycle();
        let params: Vec<_> = (0..arity)
            .map(|_| {
                let char_byte = [alpha.next().unwrap() as u8];
                let str = unsafe { str::from_utf8_unchecked(&char_byte) };
                Ident::new(str, Span::call_site())
            })
            .collect();
        let idxs: Vec<_> = (0..arity).map(Literal::usize_unsuffixed).collect();

        // The generic tuple (A, B, C, ...)
        let params_tuple = quote! { ( #(#params),* ) };

        let type_meta = {
            let parts = params
                .iter()
                .map(|ident| quote!( <#ident as crate::Pack>::TYPE_META ));
            quote!( crate::schema::TypeMeta::Static { size: 0, trivial: false } #(.then(#parts))* )
        };

        let describe_impl = params
            .iter()
            .map(|ident| quote!( d.describe::<#ident>(); ));

        let visit_impl = idxs.iter().map(|i| quote!( self.#i.visit(v)?; ));

        let unpack_impl = params
            .iter()
            .map(|ident| quote!( <#ident as crate::Unpack>::unpack(u)? ));

        let unpack_compatible_impl = idxs
            .iter()
            .map(|i| quote!( self.#i.unpack_compatible(u, version)?; ));

        let stream = quote! {
            // SAFETY: the fields in order; `then` never claims triviality.
            unsafe impl<#(#params),*> crate::Pack for #params_tuple
            where
                #(#params: crate::Pack,)*
            {
                const TYPE_META: crate::schema::TypeMeta = #type_meta;

                #[inline]
                fn describe(d: &mut crate::signature::Describe) {
                    d.code(crate::signature::code::TUPLE);
                    #(#describe_impl)*
                    d.code(crate::signature::code::END);
                }

                #[inline]
                fn visit<Vis: crate::schema::Visitor>(
                    &self,
                    v: &mut Vis,
                ) -> ::core::result::Result<(), Vis::Error> {
                    #(#visit_impl)*
                    Ok(())
                }
            }

            impl<#(#params),*> crate::Unpack for #params_tuple
            where
                #(#params: crate::Unpack,)*
            {
                #[inline]
                fn unpack(u: &mut crate::unpack::Unpacker<'_>) -> crate::ReadResult<Self> {
                    Ok(( #(#unpack_impl),* ))
                }

                #[inline]
                fn unpack_compatible(
                    &mut self,
                    u: &mut crate::unpack::Unpacker<'_>,
                    version: u64,
                ) -> crate::ReadResult<()> {
                    #(#unpack_compatible_impl)*
                    Ok(())
                }
            }
        };

        write!(out, "{stream}")?;
    }

    Ok(())
}
