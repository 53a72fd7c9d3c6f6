//! Internal macros for flipsat.
use proc_macro2::Span;
use quote::quote;
use syn::{Attribute, Expr, Ident, Lit, LitStr, Meta, MetaNameValue};
use synstructure::decl_derive;

/// One option field as described by its documentation.
struct OptionField {
    ident: Ident,
    name: String,
    default: Expr,
    min: Expr,
    max: Expr,
    description: String,
}

/// Concatenated doc comment lines of a field.
fn doc_text(attrs: &[Attribute]) -> String {
    let mut text = String::new();
    for attr in attrs.iter() {
        if let Ok(Meta::NameValue(MetaNameValue {
            ident,
            lit: Lit::Str(doc_str),
            ..
        })) = attr.parse_meta()
        {
            if ident != "doc" {
                continue;
            }
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(doc_str.value().trim());
        }
    }
    text
}

fn parse_expr(text: &str) -> Expr {
    LitStr::new(text.trim(), Span::call_site())
        .parse()
        .expect("error parsing option expression")
}

/// Derives `Default` and `OptionTable` from the documentation.
///
/// Every field must be an `i32` whose doc comment contains `(Default: <expr>)` and
/// `(Range: <expr>..=<expr>)`. The remaining text becomes the option description.
fn derive_option_table(s: synstructure::Structure) -> proc_macro2::TokenStream {
    let variant = match s.variants() {
        [variant] => variant,
        _ => panic!("OptionTable requires a struct"),
    };

    let default_re = regex::Regex::new(r"\(Default: ([^)]*)\)").unwrap();
    let range_re = regex::Regex::new(r"\(Range: ([^)]*?)\.\.=([^)]*)\)").unwrap();

    let mut fields = vec![];

    for field in variant.ast().fields.iter() {
        let ident = field
            .ident
            .clone()
            .expect("OptionTable requires named fields");
        let doc = doc_text(&field.attrs);

        let default = default_re
            .captures(&doc)
            .unwrap_or_else(|| panic!("option {} lacks a default", ident));
        let range = range_re
            .captures(&doc)
            .unwrap_or_else(|| panic!("option {} lacks a range", ident));

        let description = range_re
            .replace(&default_re.replace(&doc, ""), "")
            .trim()
            .to_string();

        fields.push(OptionField {
            name: ident.to_string(),
            default: parse_expr(&default[1]),
            min: parse_expr(&range[1]),
            max: parse_expr(&range[2]),
            description,
            ident,
        });
    }

    let body = variant.construct(|_, index| fields[index].default.clone());

    let default_impl = s.gen_impl(quote! {
        gen impl Default for @Self {
            fn default() -> Self {
                #body
            }
        }
    });

    let name = &s.ast().ident;

    let names = fields.iter().map(|field| &field.name);
    let defaults = fields.iter().map(|field| &field.default);
    let mins = fields.iter().map(|field| &field.min);
    let maxs = fields.iter().map(|field| &field.max);
    let descriptions = fields.iter().map(|field| &field.description);

    let get_indices = 0..fields.len();
    let get_idents = fields.iter().map(|field| &field.ident);
    let mut_indices = 0..fields.len();
    let mut_idents = fields.iter().map(|field| &field.ident);

    quote! {
        #default_impl

        impl crate::config::OptionTable for #name {
            const DESCRIPTORS: &'static [crate::config::OptionDescriptor] = &[
                #(
                    crate::config::OptionDescriptor {
                        name: #names,
                        default: #defaults,
                        min: #mins,
                        max: #maxs,
                        description: #descriptions,
                    },
                )*
            ];

            fn value(&self, index: usize) -> i32 {
                match index {
                    #( #get_indices => self.#get_idents, )*
                    _ => panic!("option index {} out of range", index),
                }
            }

            fn value_mut(&mut self, index: usize) -> &mut i32 {
                match index {
                    #( #mut_indices => &mut self.#mut_idents, )*
                    _ => panic!("option index {} out of range", index),
                }
            }
        }
    }
}

decl_derive!([OptionTable] => derive_option_table);
