//! `#[tool]`: expose a plain Rust function to an agent as a callable tool.

use proc_macro::TokenStream;
use proc_macro_crate::{FoundCrate, crate_name};
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::{AttributeArgs, FnArg, Ident, ItemFn, Lit, LitStr, Meta, NestedMeta, Pat, Type, parse_macro_input};

/// Path to `agentchat_ext` as seen from the expansion site.
///
/// A dependent that renamed the crate gets its alias. Everything else,
/// including the crate itself, goes through `::agentchat_ext`, which the
/// crate root re-binds with `extern crate self as agentchat_ext`.
fn agentchat_path() -> TokenStream2 {
    if let Ok(FoundCrate::Name(alias)) = crate_name("agentchat-ext") {
        let alias = Ident::new(&alias, Span::call_site());
        return quote!(::#alias);
    }
    quote!(::agentchat_ext)
}

/// Settings read from `#[tool(...)]`.
#[derive(Default)]
struct ToolAttr {
    name: Option<String>,
    description: Option<String>,
    param_docs: Vec<(String, String)>,
}

impl ToolAttr {
    fn parse(args: AttributeArgs) -> Self {
        let mut attr = Self::default();
        for arg in args {
            let NestedMeta::Meta(meta) = arg else { continue };
            match meta {
                Meta::NameValue(nv) => {
                    let Lit::Str(value) = nv.lit else { continue };
                    if nv.path.is_ident("name") {
                        attr.name = Some(value.value());
                    } else if nv.path.is_ident("description") {
                        attr.description = Some(value.value());
                    }
                }
                Meta::List(list) if list.path.is_ident("params") => {
                    attr.param_docs.extend(list.nested.into_iter().filter_map(|nested| match nested {
                        NestedMeta::Meta(Meta::NameValue(nv)) => match (nv.path.get_ident(), nv.lit) {
                            (Some(ident), Lit::Str(doc)) => Some((ident.to_string(), doc.value())),
                            _ => None,
                        },
                        _ => None,
                    }));
                }
                _ => {}
            }
        }
        attr
    }

    fn doc_for(&self, param: &str) -> Option<&str> {
        self.param_docs
            .iter()
            .find(|(name, _)| name == param)
            .map(|(_, doc)| doc.as_str())
    }
}

/// One function argument, carried into the generated params struct.
struct Param {
    ident: Ident,
    ty: Type,
}

fn params_of(func: &ItemFn) -> syn::Result<Vec<Param>> {
    func.sig
        .inputs
        .iter()
        .map(|input| match input {
            FnArg::Typed(typed) => match &*typed.pat {
                Pat::Ident(binding) => Ok(Param {
                    ident: binding.ident.clone(),
                    ty: (*typed.ty).clone(),
                }),
                other => Err(syn::Error::new_spanned(other, "tool arguments must be plain identifiers")),
            },
            FnArg::Receiver(receiver) => Err(syn::Error::new_spanned(receiver, "a tool cannot take `self`")),
        })
        .collect()
}

/// Turn a function into a tool an agent can call.
///
/// Alongside the function this emits `<Name>Params`, which the JSON
/// arguments are deserialized into, and `<Name>Tool`, a unit struct
/// implementing `Tool`. Every argument needs an entry in `params(...)`;
/// `Option<T>` arguments are advertised as optional.
///
/// ```ignore
/// #[tool(description = "Annual leave days for a country", params(country = "ISO country code"))]
/// fn leave_days(country: String) -> String { ... }
/// ```
#[proc_macro_attribute]
pub fn tool(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attr = ToolAttr::parse(parse_macro_input!(attr as AttributeArgs));
    let func = parse_macro_input!(item as ItemFn);
    expand(attr, func).unwrap_or_else(syn::Error::into_compile_error).into()
}

fn expand(attr: ToolAttr, func: ItemFn) -> syn::Result<TokenStream2> {
    let fn_ident = &func.sig.ident;
    let Some(description) = attr.description.as_deref() else {
        return Err(syn::Error::new_spanned(fn_ident, "missing `description = \"...\"` on #[tool]"));
    };
    let params = params_of(&func)?;

    if let Some((unknown, _)) = attr
        .param_docs
        .iter()
        .find(|(name, _)| !params.iter().any(|p| p.ident == name))
    {
        return Err(syn::Error::new_spanned(
            fn_ident,
            format!("`{unknown}` in params(...) is not an argument of `{fn_ident}`"),
        ));
    }

    let mut schema = Vec::with_capacity(params.len());
    for Param { ident, ty } in &params {
        let Some(doc) = attr.doc_for(&ident.to_string()) else {
            return Err(syn::Error::new_spanned(
                ident,
                format!("add a description for `{ident}` to params(...)"),
            ));
        };
        schema.push((ident, json_type(ty), !is_option(ty), doc.to_string()));
    }

    let host = agentchat_path();
    let serde_crate = LitStr::new(&format!("{host}::serde").replace(' ', ""), Span::call_site());
    let stem = pascal_case(&fn_ident.to_string());
    let params_ident = Ident::new(&format!("{stem}Params"), fn_ident.span());
    let tool_ident = Ident::new(&format!("{stem}Tool"), fn_ident.span());
    let tool_name = attr.name.clone().unwrap_or_else(|| fn_ident.to_string());

    let fields = params.iter().map(|Param { ident, ty }| quote!(pub #ident: #ty));
    let forwarded = params.iter().map(|Param { ident, .. }| quote!(params.#ident));
    let call = if func.sig.asyncness.is_some() {
        quote!(#fn_ident(#(#forwarded),*).await)
    } else {
        quote!(#fn_ident(#(#forwarded),*))
    };
    let arg_schemas = schema.iter().map(|(ident, arg_type, required, doc)| {
        let name = LitStr::new(&ident.to_string(), ident.span());
        quote! {
            #host::tools::traits::ArgSchema {
                name: #name.into(),
                arg_type: #arg_type.into(),
                description: #doc.into(),
                required: #required,
            }
        }
    });

    Ok(quote! {
        #func

        #[derive(#host::serde::Deserialize)]
        #[serde(crate = #serde_crate)]
        pub struct #params_ident {
            #(#fields,)*
        }

        pub struct #tool_ident;

        #[#host::async_trait::async_trait]
        impl #host::tools::traits::Tool for #tool_ident {
            fn name(&self) -> &str {
                #tool_name
            }

            fn description(&self) -> &str {
                #description
            }

            fn args(&self) -> Vec<#host::tools::traits::ArgSchema> {
                vec![#(#arg_schemas),*]
            }

            async fn run(
                &self,
                input: #host::serde_json::Value,
            ) -> Result<String, #host::tools::error::ToolError> {
                let params: #params_ident = #host::serde_json::from_value(input)
                    .map_err(|e| #host::tools::error::ToolError::ParamsNotMatched(e.to_string()))?;
                Ok(#call)
            }
        }
    })
}

/// `leave_days` -> `LeaveDays`.
fn pascal_case(snake: &str) -> String {
    snake
        .split('_')
        .flat_map(|word| {
            let mut chars = word.chars();
            chars
                .next()
                .map(|first| first.to_uppercase().chain(chars))
                .into_iter()
                .flatten()
        })
        .collect()
}

/// Outermost path segment of `ty`, e.g. `Option` for `Option<u32>`.
fn outer_segment(ty: &Type) -> Option<&syn::PathSegment> {
    let Type::Path(path) = ty else { return None };
    path.path.segments.last()
}

fn is_option(ty: &Type) -> bool {
    outer_segment(ty).is_some_and(|segment| segment.ident == "Option")
}

/// JSON Schema type advertised for an argument of type `ty`.
fn json_type(ty: &Type) -> &'static str {
    let Some(segment) = outer_segment(ty) else { return "object" };
    if segment.ident == "Option" {
        return match &segment.arguments {
            syn::PathArguments::AngleBracketed(generics) => match generics.args.first() {
                Some(syn::GenericArgument::Type(inner)) => json_type(inner),
                _ => "object",
            },
            _ => "object",
        };
    }
    match segment.ident.to_string().as_str() {
        "String" | "str" => "string",
        "bool" => "boolean",
        "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64" | "u128" | "usize" => {
            "integer"
        }
        "f32" | "f64" => "number",
        "Vec" => "array",
        _ => "object",
    }
}
