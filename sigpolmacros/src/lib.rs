//! Procedural macros used in the definition and implementation of getters and setters for ConstraintSettings

use quote::quote;
use syn::parse::ParseStream;
use syn::parse::{Parse, Result};
use syn::{Expr, Ident, Token};

type ValueName = Ident;
type ValueType = Ident;
type DefaultValue = Expr;

/// Signature contains the results of parsing a cs_gets_and_sets definition, i.e., the
/// name of a value stored in a ConstraintSettings map and the corresponding type.
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

/// SignatureWithDefault contains the results of parsing a cs_gets_and_sets_with_default definition, i.e.,
/// the name of a value stored in a ConstraintSettings map, the corresponding type and the default value.
///     ```text
///     cs_gets_and_sets_with_default!(PS_INITIAL_EXPLICIT_POLICY_INDICATOR, bool, false);
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
/// types like u8, u32, etc.
fn is_string_numeric(str: &str) -> bool {
    !str.is_empty() && str.chars().all(|c| c.is_numeric())
}

/// Maps a Rust type name to the name of the ConstraintSettingsTypes variant that carries it.
fn variant_name(type_name: &str) -> String {
    if type_name == "bool" {
        "Bool".to_string()
    } else if is_string_numeric(&type_name[1..]) {
        type_name.to_uppercase()
    } else {
        type_name.to_string()
    }
}

/// Returns the getter and setter names for a PS_ prefixed key name.
fn accessor_names(flag: &Ident) -> (String, String) {
    let flag_str = format!("{}", flag)[3..].to_lowercase();
    (format!("get_{}", flag_str), format!("set_{}", flag_str))
}

/// `cs_gets_and_sets` generates an `Option` returning getter and a setter for a ConstraintSettings key.
#[proc_macro]
pub fn cs_gets_and_sets(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let signature = syn::parse_macro_input!(input as Signature);
    let flag = signature.value_name;
    let return_t = signature.value_type;

    let (getter_str, setter_str) = accessor_names(&flag);
    let getter = syn::Ident::new(&getter_str, flag.span());
    let setter = syn::Ident::new(&setter_str, flag.span());
    let cs_type = syn::Ident::new(&variant_name(&return_t.to_string()), return_t.span());

    let getter_comment = format!(
        "`{}` is used to retrieve `{}` items from a [`ConstraintSettings`] instance",
        getter_str, flag
    );
    let setter_comment = format!(
        "`{}` is used to set `{}` items in a [`ConstraintSettings`] instance",
        setter_str, flag
    );

    let tokens = quote! {
        impl ConstraintSettings {
            #[doc = #getter_comment]
            pub fn #getter(&self) -> Option<#return_t> {
                match self.0.get(#flag) {
                    Some(ConstraintSettingsTypes::#cs_type(v)) => Some(v.clone()),
                    _ => None,
                }
            }
            #[doc = #setter_comment]
            pub fn #setter(&mut self, v: #return_t) {
                self.0.insert(#flag.to_string(), ConstraintSettingsTypes::#cs_type(v));
            }
        }
    };
    tokens.into()
}

/// `cs_gets_and_sets_with_default` generates a getter that falls back to a default value and a
/// setter for a ConstraintSettings key.
#[proc_macro]
pub fn cs_gets_and_sets_with_default(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let signature = syn::parse_macro_input!(input as SignatureWithDefault);
    let flag = signature.value_name;
    let return_t = signature.value_type;
    let default_value = signature.default_value;

    let (getter_str, setter_str) = accessor_names(&flag);
    let getter = syn::Ident::new(&getter_str, flag.span());
    let setter = syn::Ident::new(&setter_str, flag.span());
    let cs_type = syn::Ident::new(&variant_name(&return_t.to_string()), return_t.span());

    let getter_comment = format!(
        "`{}` is used to retrieve `{}` items from a [`ConstraintSettings`] instance, returning a default value if absent",
        getter_str, flag
    );
    let setter_comment = format!(
        "`{}` is used to set `{}` items in a [`ConstraintSettings`] instance",
        setter_str, flag
    );

    let tokens = quote! {
        impl ConstraintSettings {
            #[doc = #getter_comment]
            pub fn #getter(&self) -> #return_t {
                match self.0.get(#flag) {
                    Some(ConstraintSettingsTypes::#cs_type(v)) => v.clone(),
                    _ => #default_value,
                }
            }
            #[doc = #setter_comment]
            pub fn #setter(&mut self, v: #return_t) {
                self.0.insert(#flag.to_string(), ConstraintSettingsTypes::#cs_type(v));
            }
        }
    };
    tokens.into()
}
