use proc_macro::TokenStream;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::{Expr, ExprLit, ImplItem, ItemFn, ItemImpl, Lit, Meta, MetaNameValue};

/// Declare a job
///
/// # On a function (auto-registered)
///
/// ```rust,ignore
/// #[job(schedule = "@every 5m")]
/// fn purge_sessions() {
///     println!("purging expired sessions");
/// }
///
/// #[job(schedule = "${cron.nightly:0 3 * * *}", name = "nightly-report", enabled = "${reports.enabled:true}")]
/// fn report() {}
/// ```
///
/// The function stays callable as before. It is collected into the job
/// registry and scheduled by `RunnerHandle::schedule_registered()`.
///
/// # On an `impl Runnable` block (named runnable)
///
/// ```rust,ignore
/// struct Digest;
///
/// #[job]
/// impl Runnable for Digest {
///     fn run(&self) {}
/// }
/// ```
///
/// Adds a `name()` returning `"Digest"`, or the `name = "..."` argument.
/// A hand-written `name()` is left untouched.
///
/// # Parameters
///
/// - `schedule`: schedule descriptor, required on functions
/// - `name`: display name, defaults to the function or type name
/// - `enabled`: `true`/`false` or a config placeholder
#[proc_macro_attribute]
pub fn job(args: TokenStream, input: TokenStream) -> TokenStream {
    let attr_args = syn::parse_macro_input!(args with Punctuated::<Meta, syn::Token![,]>::parse_terminated);

    let job_args = match JobArgs::parse(&attr_args) {
        Ok(job_args) => job_args,
        Err(e) => return e.to_compile_error().into(),
    };

    if let Ok(input_fn) = syn::parse::<ItemFn>(input.clone()) {
        return handle_job_function(job_args, input_fn);
    }

    if let Ok(input_impl) = syn::parse::<ItemImpl>(input.clone()) {
        return handle_job_impl(job_args, input_impl);
    }

    syn::Error::new(
        proc_macro2::Span::call_site(),
        "job can only be applied to:\n  1. plain functions (auto-registered jobs)\n  2. impl Runnable blocks (named runnables)",
    )
    .to_compile_error()
    .into()
}

#[derive(Default)]
struct JobArgs {
    schedule: Option<String>,
    name: Option<String>,
    enabled: Option<String>,
}

impl JobArgs {
    fn parse(attr_args: &Punctuated<Meta, syn::Token![,]>) -> syn::Result<Self> {
        let mut args = JobArgs::default();

        for arg in attr_args {
            let Meta::NameValue(MetaNameValue { path, value, .. }) = arg else {
                return Err(syn::Error::new_spanned(arg, "expected `key = value`"));
            };
            let key = path.get_ident().map(|i| i.to_string()).unwrap_or_default();

            match key.as_str() {
                "schedule" => args.schedule = Some(string_value(value, "schedule")?),
                "name" => args.name = Some(string_value(value, "name")?),
                "enabled" => {
                    args.enabled = Some(match value {
                        Expr::Lit(ExprLit { lit: Lit::Bool(b), .. }) => b.value.to_string(),
                        Expr::Lit(ExprLit { lit: Lit::Str(s), .. }) => s.value(),
                        _ => {
                            return Err(syn::Error::new_spanned(
                                value,
                                "enabled must be bool or string",
                            ))
                        }
                    })
                }
                _ => return Err(syn::Error::new_spanned(path, "unknown job argument")),
            }
        }

        Ok(args)
    }
}

fn string_value(value: &Expr, key: &str) -> syn::Result<String> {
    match value {
        Expr::Lit(ExprLit { lit: Lit::Str(s), .. }) => Ok(s.value()),
        _ => Err(syn::Error::new_spanned(value, format!("{key} must be a string"))),
    }
}

fn handle_job_function(args: JobArgs, input_fn: ItemFn) -> TokenStream {
    let sig = &input_fn.sig;
    if sig.asyncness.is_some() || !sig.inputs.is_empty() || !matches!(sig.output, syn::ReturnType::Default) {
        return syn::Error::new_spanned(sig, "job functions must be synchronous `fn()` with no arguments")
            .to_compile_error()
            .into();
    }

    let Some(schedule) = args.schedule else {
        return syn::Error::new_spanned(sig, "job functions need `schedule = \"...\"`")
            .to_compile_error()
            .into();
    };

    let fn_name = &sig.ident;
    let name = args.name.unwrap_or_else(|| fn_name.to_string());
    let enabled = args.enabled.unwrap_or_else(|| "true".to_string());

    let register_fn_name = syn::Ident::new(&format!("__register_job_{}", fn_name), fn_name.span());

    let expanded = quote! {
        #input_fn

        // Auto-registration using linkme
        #[::jobrunner::jobrunner_runtime::linkme::distributed_slice(::jobrunner::jobrunner_runtime::REGISTERED_JOBS)]
        #[linkme(crate = ::jobrunner::jobrunner_runtime::linkme)]
        fn #register_fn_name() -> ::jobrunner::jobrunner_runtime::RegisteredJob {
            ::jobrunner::jobrunner_runtime::RegisteredJob {
                name: #name,
                schedule: #schedule,
                enabled: #enabled,
                handler: #fn_name,
            }
        }
    };

    TokenStream::from(expanded)
}

fn handle_job_impl(args: JobArgs, mut input_impl: ItemImpl) -> TokenStream {
    if args.schedule.is_some() || args.enabled.is_some() {
        return syn::Error::new_spanned(
            &input_impl.self_ty,
            "schedule and enabled apply to functions; pass runnable instances to RunnerHandle::schedule",
        )
        .to_compile_error()
        .into();
    }

    let has_name = input_impl
        .items
        .iter()
        .any(|item| matches!(item, ImplItem::Fn(f) if f.sig.ident == "name"));

    if !has_name {
        let impl_type = &input_impl.self_ty;
        let name = args
            .name
            .unwrap_or_else(|| quote!(#impl_type).to_string().replace(' ', ""));
        let name_fn: ImplItem = syn::parse_quote! {
            fn name(&self) -> ::core::option::Option<&str> {
                ::core::option::Option::Some(#name)
            }
        };
        input_impl.items.push(name_fn);
    }

    TokenStream::from(quote!(#input_impl))
}
