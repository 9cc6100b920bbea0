//! Procedural macros used in the definition and implementation of getters and setters for StapleSettings

use proc_macro2::Span;
use quote::quote;
use syn::parse::ParseStream;
use syn::parse::{Parse, Result};
use syn::{Expr, Ident, Token};

type ValueName = Ident;
type ValueType = Ident;
type DefaultValue = Expr;

/// Signature contains the results of parsing a sts_gets_and_sets definition, i.e., the
/// name of a value stored in a StapleSettings map and the corresponding type.
struct Signature {
    value_name: ValueName,
    value_type: ValueType,
}

impl Parse for Signature {
    fn parse(stream: ParseStream<'_>) -> Result<Self> {
        let value_name = stream.parse()?;
        let _comma: Token!(,) = stream.parse()?;
        let value_type = stream.parse()?;
        Ok(Signature {
            value_name,
            value_type,
        })
    }
}

/// SignatureWithDefault contains the results of parsing a sts_gets_and_sets_with_default definition,
/// i.e., the name of a value stored in a StapleSettings map, the corresponding type and the default value.
///     ```text
///     sts_gets_and_sets_with_default!(PS_PORT, u16, 443);
///     ```
struct SignatureWithDefault {
    value_name: ValueName,
    value_type: ValueType,
    default_value: DefaultValue,
}

impl Parse for SignatureWithDefault {
    fn parse(stream: ParseStream<'_>) -> Result<Self> {
        let value_name = stream.parse()?;
        let _comma: Token!(,) = stream.parse()?;
        let value_type = stream.parse()?;
        let _comma2: Token!(,) = stream.parse()?;
        let default_value = stream.parse()?;
        Ok(SignatureWithDefault {
            value_name,
            value_type,
            default_value,
        })
    }
}

/// is_string_numeric is used to determine if a string value contains only numeric characters.
/// It is used to process a slice that omits the first character, i.e., in order to identify
/// types like u8, u16, etc.
fn is_string_numeric(str: &str) -> bool {
    !str.is_empty() && str.chars().all(|c| c.is_numeric())
}

/// Names shared by both macros: getter, setter and the StapleSettingsTypes variant for a value type.
struct Accessors {
    getter: Ident,
    setter: Ident,
    variant: Ident,
    getter_comment: String,
    setter_comment: String,
}

fn accessors(flag: &Ident, value_type: &Ident) -> Accessors {
    // PS_PORT yields get_port and set_port
    let flag_name = flag.to_string();
    let flag_str = flag_name
        .strip_prefix("PS_")
        .unwrap_or(flag_name.as_str())
        .to_lowercase();
    let getter_str = format!("get_{}", flag_str);
    let setter_str = format!("set_{}", flag_str);

    let type_str = value_type.to_string();
    let variant_str = if is_string_numeric(&type_str[1..]) {
        type_str.to_uppercase()
    } else {
        type_str
    };

    Accessors {
        getter: Ident::new(&getter_str, flag.span()),
        setter: Ident::new(&setter_str, flag.span()),
        variant: Ident::new(&variant_str, Span::call_site()),
        getter_comment: format!(
            "`{}` is used to retrieve `{}` items from a [`StapleSettings`] instance",
            getter_str, flag
        ),
        setter_comment: format!(
            "`{}` is used to set `{}` items in a [`StapleSettings`] instance",
            setter_str, flag
        ),
    }
}

/// Generates `get_*` (returning an `Option`) and `set_*` functions for a StapleSettings key.
#[proc_macro]
pub fn sts_gets_and_sets(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let signature = syn::parse_macro_input!(input as Signature);
    let flag = signature.value_name;
    let return_t = signature.value_type;
    let Accessors {
        getter,
        setter,
        variant,
        getter_comment,
        setter_comment,
    } = accessors(&flag, &return_t);

    let tokens = quote! {
            #[doc = #getter_comment]
            pub fn #getter(sts: &StapleSettings) -> Option<#return_t> {
                match sts.get(#flag) {
                    Some(StapleSettingsTypes::#variant(v)) => Some(v.clone()),
                    _ => None,
                }
            }
            #[doc = #setter_comment]
            pub fn #setter(sts: &mut StapleSettings, v: #return_t) {
                sts.insert(#flag.to_string(), StapleSettingsTypes::#variant(v));
            }
    };
    tokens.into()
}

/// Generates `get_*` (falling back to the given default) and `set_*` functions for a StapleSettings key.
#[proc_macro]
pub fn sts_gets_and_sets_with_default(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let signature = syn::parse_macro_input!(input as SignatureWithDefault);
    let flag = signature.value_name;
    let return_t = signature.value_type;
    let default_value = signature.default_value;
    let Accessors {
        getter,
        setter,
        variant,
        getter_comment,
        setter_comment,
    } = accessors(&flag, &return_t);

    let tokens = quote! {
            #[doc = #getter_comment]
            pub fn #getter(sts: &StapleSettings) -> #return_t {
                match sts.get(#flag) {
                    Some(StapleSettingsTypes::#variant(v)) => v.clone(),
                    _ => #default_value,
                }
            }
            #[doc = #setter_comment]
            pub fn #setter(sts: &mut StapleSettings, v: #return_t) {
                sts.insert(#flag.to_string(), StapleSettingsTypes::#variant(v));
            }
    };
    tokens.into()
}
