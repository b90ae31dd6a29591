//! Procedural macros for floss-actions

use darling::util::Override;
use darling::{FromDeriveInput, FromMeta, FromVariant};
use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

/// Container-level attributes for #[derive(ActionMeta)]
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(action), supports(struct_any, enum_any))]
struct ActionOpts {
    ident: syn::Ident,
    generics: syn::Generics,
    data: darling::ast::Data<ActionVariant, ()>,

    #[darling(flatten)]
    meta: MetaOpts,
}

/// Variant-level attributes; each one overrides the container's
#[derive(Debug, FromVariant)]
#[darling(attributes(action))]
struct ActionVariant {
    ident: syn::Ident,
    fields: darling::ast::Fields<()>,

    #[darling(flatten)]
    meta: MetaOpts,
}

/// Attributes accepted on both containers and variants
#[derive(Debug, Default, FromMeta)]
struct MetaOpts {
    /// Explicit action name
    #[darling(default)]
    name: Option<String>,

    /// Undo label; `undo` alone derives it from the type or variant name
    #[darling(default)]
    undo: Option<Override<String>>,

    /// Skip the store commit after success
    #[darling(default)]
    no_commit: bool,

    /// Confirmation strings, marking the action destructive
    #[darling(default)]
    destructive: Option<DestructiveOpts>,
}

/// `destructive(title = "...", message = "...", confirm = "...")`
#[derive(Debug, Clone, FromMeta)]
struct DestructiveOpts {
    title: String,
    message: String,
    confirm: String,
}

impl DestructiveOpts {
    fn validate(&self, span: Span) -> syn::Result<()> {
        for (field, value) in [
            ("title", &self.title),
            ("message", &self.message),
            ("confirm", &self.confirm),
        ] {
            if value.trim().is_empty() {
                return Err(syn::Error::new(
                    span,
                    format!("destructive action is missing confirmation {}", field),
                ));
            }
        }
        Ok(())
    }
}

/// Split a PascalCase string into parts
fn split_pascal_case(s: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();

    for ch in s.chars() {
        if ch.is_uppercase() && !current.is_empty() {
            parts.push(current);
            current = String::new();
        }
        current.push(ch);
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

/// "MarkInStock" -> "Mark In Stock"
fn to_title(s: &str) -> String {
    split_pascal_case(s).join(" ")
}

/// Metadata resolved for one struct or one enum variant
struct Resolved {
    name: String,
    undo: Option<String>,
    commit: bool,
    destructive: Option<DestructiveOpts>,
}

impl Resolved {
    fn new(ident: &syn::Ident, container: &MetaOpts, own: Option<&MetaOpts>) -> syn::Result<Self> {
        // An enum-level name would collide across variants, so only structs use it.
        let name = match own {
            Some(own) => own.name.clone(),
            None => container.name.clone(),
        }
        .unwrap_or_else(|| ident.to_string());

        let undo = own
            .and_then(|m| m.undo.clone())
            .or_else(|| container.undo.clone())
            .map(|undo| match undo {
                Override::Inherit => to_title(&name),
                Override::Explicit(label) => label,
            });

        let commit = !(container.no_commit || own.is_some_and(|m| m.no_commit));

        let destructive = own
            .and_then(|m| m.destructive.clone())
            .or_else(|| container.destructive.clone());
        if let Some(destructive) = &destructive {
            destructive.validate(ident.span())?;
        }

        Ok(Self {
            name,
            undo,
            commit,
            destructive,
        })
    }

    fn name_expr(&self) -> TokenStream2 {
        let name = &self.name;
        quote! { #name }
    }

    fn undo_expr(&self) -> TokenStream2 {
        match &self.undo {
            Some(label) => quote! {
                ::core::option::Option::Some(::std::borrow::Cow::Borrowed(#label))
            },
            None => quote! { ::core::option::Option::None },
        }
    }

    fn commit_expr(&self) -> TokenStream2 {
        let commit = self.commit;
        quote! { #commit }
    }

    fn confirmation_expr(&self) -> TokenStream2 {
        match &self.destructive {
            Some(DestructiveOpts {
                title,
                message,
                confirm,
            }) => quote! {
                ::core::option::Option::Some(floss_actions::Confirmation::new(#title, #message, #confirm))
            },
            None => quote! { ::core::option::Option::None },
        }
    }
}

/// Derive macro for the ActionMeta trait
///
/// Generates `name()`, `undo_name()`, `commit_on_complete()` and
/// `confirmation()` from attributes.
///
/// - `name = "..."`: override the name (defaults to the type name, or the
///   variant name for enums)
/// - `undo` or `undo = "..."`: undo label, derived from the name when bare
/// - `no_commit`: do not commit the store after success
/// - `destructive(title = "...", message = "...", confirm = "...")`: ask for
///   confirmation first. All three strings are required and non-empty.
///
/// On enums every variant may carry its own attributes, which take precedence
/// over the enum's.
///
/// # Example
/// ```ignore
/// #[derive(ActionMeta)]
/// #[action(undo, destructive(title = "Delete Thread", message = "Are you sure?", confirm = "Delete"))]
/// struct DeleteThread {
///     catalog: Arc<Catalog>,
///     id: ThreadId,
/// }
///
/// #[derive(ActionMeta)]
/// #[action(undo)]
/// enum ShoppingListEdit {
///     Increment(ThreadId),
///     Decrement(ThreadId),
///     #[action(destructive(title = "Clear List", message = "Remove every item?", confirm = "Clear"))]
///     Clear,
/// }
///
/// assert_eq!(ShoppingListEdit::Clear.name(), "Clear");
/// assert!(ShoppingListEdit::Clear.confirmation().is_some());
/// ```
#[proc_macro_derive(ActionMeta, attributes(action))]
pub fn derive_action_meta(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let opts = match ActionOpts::from_derive_input(&input) {
        Ok(opts) => opts,
        Err(e) => return e.write_errors().into(),
    };

    match expand(&opts) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn expand(opts: &ActionOpts) -> syn::Result<TokenStream2> {
    let name = &opts.ident;
    let (impl_generics, ty_generics, where_clause) = opts.generics.split_for_impl();

    let body = match &opts.data {
        darling::ast::Data::Struct(_) => {
            let resolved = Resolved::new(name, &opts.meta, None)?;
            let name_expr = resolved.name_expr();
            let undo_expr = resolved.undo_expr();
            let commit_expr = resolved.commit_expr();
            let confirmation_expr = resolved.confirmation_expr();

            quote! {
                fn name(&self) -> &'static str {
                    #name_expr
                }

                fn undo_name(&self) -> ::core::option::Option<::std::borrow::Cow<'static, str>> {
                    #undo_expr
                }

                fn commit_on_complete(&self) -> bool {
                    #commit_expr
                }

                fn confirmation(&self) -> ::core::option::Option<floss_actions::Confirmation> {
                    #confirmation_expr
                }
            }
        }
        darling::ast::Data::Enum(variants) => {
            if variants.is_empty() {
                return Err(syn::Error::new_spanned(
                    name,
                    "ActionMeta cannot be derived for an enum without variants",
                ));
            }

            let mut name_arms = Vec::new();
            let mut undo_arms = Vec::new();
            let mut commit_arms = Vec::new();
            let mut confirmation_arms = Vec::new();

            for v in variants {
                let resolved = Resolved::new(&v.ident, &opts.meta, Some(&v.meta))?;
                let variant = &v.ident;
                let pattern = match &v.fields.style {
                    darling::ast::Style::Unit => quote! { #name::#variant },
                    darling::ast::Style::Tuple => quote! { #name::#variant(..) },
                    darling::ast::Style::Struct => quote! { #name::#variant { .. } },
                };

                let name_expr = resolved.name_expr();
                let undo_expr = resolved.undo_expr();
                let commit_expr = resolved.commit_expr();
                let confirmation_expr = resolved.confirmation_expr();

                name_arms.push(quote! { #pattern => #name_expr });
                undo_arms.push(quote! { #pattern => #undo_expr });
                commit_arms.push(quote! { #pattern => #commit_expr });
                confirmation_arms.push(quote! { #pattern => #confirmation_expr });
            }

            quote! {
                fn name(&self) -> &'static str {
                    match self {
                        #(#name_arms),*
                    }
                }

                fn undo_name(&self) -> ::core::option::Option<::std::borrow::Cow<'static, str>> {
                    match self {
                        #(#undo_arms),*
                    }
                }

                fn commit_on_complete(&self) -> bool {
                    match self {
                        #(#commit_arms),*
                    }
                }

                fn confirmation(&self) -> ::core::option::Option<floss_actions::Confirmation> {
                    match self {
                        #(#confirmation_arms),*
                    }
                }
            }
        }
    };

    Ok(quote! {
        impl #impl_generics floss_actions::ActionMeta for #name #ty_generics #where_clause {
            #body
        }
    })
}
