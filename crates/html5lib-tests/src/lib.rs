//! Generates a `#[test]` per html5lib tree-construction case.
//!
//! ```ignore
//! html5lib_tests!("data/tree-construction/*.dat");
//! ```
//!
//! The pattern is relative to the invoking crate's manifest directory.
//! Each file becomes a module and each case a `lineNNNN` test comparing the
//! html5lib dump of the built tree with the expected `#document`.

use glob::glob;
use html5lib_tests_gen_tests::{parse_test_file, TestCase};
use proc_macro::TokenStream;
use quote::quote;
use std::{fs, path::Path, path::PathBuf};
use syn::{parse_macro_input, LitStr};

fn module_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("unknown")
        .replace(['-', '.'], "_")
}

fn test_case(test: &TestCase) -> proc_macro2::TokenStream {
    let test_name = syn::Ident::new(
        &format!("line{:04}", test.line_number),
        proc_macro2::Span::call_site(),
    );
    let input = &test.input;
    let expected = &test.expected_document;
    let scripting = test.scripting.unwrap_or(false);

    let parse = match &test.fragment_context {
        Some(context) => quote! {
            html_tree_builder_test_support::parse_fragment(#input, #context, config)
        },
        None => quote! {
            html_tree_builder_test_support::parse_document(#input, config)
        },
    };
    let dump = match test.fragment_context {
        Some(_) => quote! { html_tree_builder_test_support::to_html5lib_fragment_tree(&dom) },
        None => quote! { html_tree_builder_test_support::to_html5lib_tree(&dom) },
    };

    quote! {
        #[test]
        fn #test_name() {
            let config = html_tree_builder::TreeBuilderConfig::default().with_scripting(#scripting);
            let dom = #parse;
            assert_eq!(dom.fatal_error, None);

            let actual = #dump;
            pretty_assertions::assert_str_eq!(#expected, actual, "Error on input:\n{}", #input);
        }
    }
}

fn process_test_file(path: &Path) -> proc_macro2::TokenStream {
    let content = fs::read_to_string(path).expect("Failed to read test file");
    let test_cases = parse_test_file(&content);

    let file_mod_name = syn::Ident::new(&module_name(path), proc_macro2::Span::call_site());
    let path_str = path.to_string_lossy().to_string();
    let test_fns = test_cases.iter().map(test_case);

    quote! {
        pub mod #file_mod_name {
            // Rebuild when the data file changes.
            const _: &str = include_str!(#path_str);

            #(#test_fns)*
        }
    }
}

#[proc_macro]
pub fn html5lib_tests(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as LitStr);
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").map(PathBuf::from).unwrap_or_default();
    let pattern = manifest_dir.join(input.value());

    let mut paths: Vec<PathBuf> = glob(&pattern.to_string_lossy())
        .expect("Failed to read glob pattern")
        .map(|entry| entry.expect("Error processing test file"))
        .collect();
    paths.sort();

    let all_tests = paths.iter().map(|path| process_test_file(path));

    // Not named after this crate: the invoking test imports the macro under that name.
    let expanded = quote! {
        pub mod tree_construction {
            #(#all_tests)*
        }
    };

    expanded.into()
}
