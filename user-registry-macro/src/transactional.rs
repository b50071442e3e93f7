use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse::Parse, parse::ParseStream, parse_macro_input, ItemFn, LitBool, Path, Token};

struct TransactionArgs {
    isolation: Option<Path>,
    propagation: Option<Path>,
    read_only: Option<bool>,
}

impl Parse for TransactionArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut isolation = None;
        let mut propagation = None;
        let mut read_only = None;

        while !input.is_empty() {
            let key: syn::Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            if key == "isolation" {
                isolation = Some(input.parse::<Path>()?);
            } else if key == "propagation" {
                propagation = Some(input.parse::<Path>()?);
            } else if key == "read_only" {
                let b: LitBool = input.parse()?;
                read_only = Some(b.value);
            } else {
                return Err(syn::Error::new_spanned(
                    key,
                    "expected one of `isolation`, `propagation`, `read_only`",
                ));
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(TransactionArgs {
            isolation,
            propagation,
            read_only,
        })
    }
}

/// A bare variant name is resolved against the crate's enum; a longer path is
/// used as written.
fn enum_path(path: &Path, enum_name: TokenStream2) -> TokenStream2 {
    match path.get_ident() {
        Some(ident) => quote! { ::user_registry::transactional::#enum_name::#ident },
        None => quote! { #path },
    }
}

pub fn transactional_attribute(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as TransactionArgs);
    let mut input = parse_macro_input!(item as ItemFn);

    if input.sig.asyncness.is_none() {
        return syn::Error::new_spanned(
            input.sig.fn_token,
            "#[transactional] can only be used on async functions",
        )
        .to_compile_error()
        .into();
    }

    let block = &input.block;

    let isolation_code = match &args.isolation {
        Some(path) => {
            let p = enum_path(path, quote! { IsolationLevel });
            quote! { Some(#p) }
        }
        None => quote! { None },
    };

    let propagation_code = match &args.propagation {
        Some(path) => enum_path(path, quote! { Propagation }),
        None => quote! { ::user_registry::transactional::Propagation::Required },
    };

    let read_only_code = args.read_only.unwrap_or(false);

    let new_block = quote! {
        {
            let options = ::user_registry::transactional::TransactionOptions {
                isolation: #isolation_code,
                propagation: #propagation_code,
                read_only: #read_only_code,
            };

            let joins_outer = options.propagation
                == ::user_registry::transactional::Propagation::Required
                && ::user_registry::transactional::get_current_transaction().is_some();

            if joins_outer {
                // The outer scope owns commit and rollback.
                (async move #block).await
            } else {
                let tx = ::user_registry::transactional::TransactionManager::begin(
                    &*self.transaction_manager,
                    options,
                )
                .await?;
                let tx = ::std::sync::Arc::new(::tokio::sync::Mutex::new(tx));

                let result = ::user_registry::transactional::ACTIVE_TRANSACTION
                    .scope(Some(::std::sync::Arc::clone(&tx)), async move #block)
                    .await;

                let mut guard = tx.lock().await;
                match &result {
                    Ok(_) => {
                        ::user_registry::transactional::Transaction::commit(&mut **guard).await?;
                    }
                    Err(_) => {
                        if let Err(e) =
                            ::user_registry::transactional::Transaction::rollback(&mut **guard).await
                        {
                            ::tracing::warn!(error = %e, "rollback failed");
                        }
                    }
                }

                result
            }
        }
    };

    input.block = match syn::parse2(new_block) {
        Ok(block) => block,
        Err(e) => return e.to_compile_error().into(),
    };

    TokenStream::from(quote! {
        #input
    })
}
