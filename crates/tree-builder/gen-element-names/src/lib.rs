//! Builds the element vocabulary tables from a JSON description.
//!
//! ```ignore
//! gen_element_names::element_names!("data/element_names.json");
//! ```
//!
//! The path is relative to the invoking crate's manifest directory. The
//! expansion defines `TagName`, `ELEMENT_NAMES` and `ELEMENT_HASHES`, and
//! expects `Atom`, `DispatchGroup`, `ElementFlags` and `ElementName` to be in
//! scope.

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use serde::Deserialize;
use std::{collections::HashMap, fs, path::PathBuf};
use syn::{parse_macro_input, Ident, LitStr};

#[derive(Deserialize)]
struct Vocabulary {
    html: Vec<Entry>,
    mathml: Vec<Entry>,
    svg: Vec<Entry>,
}

#[derive(Deserialize)]
struct Entry {
    name: String,
    /// Local name in the SVG namespace, when it differs.
    camel: Option<String>,
    group: String,
    #[serde(default)]
    flags: Vec<String>,
}

/// Mirror of `element_name::name_hash`.
fn name_hash(buf: &[u8]) -> u32 {
    let Some(&first) = buf.first() else {
        return 0;
    };
    let len = buf.len() as u32;
    let first = (first as u32) << 19;
    let mut second: u32 = 1 << 23;
    let mut third: u32 = 0;
    let mut fourth: u32 = 0;
    let mut fifth: u32 = 0;

    match buf.len() {
        n if n >= 4 => {
            second = (buf[n - 4] as u32) << 4;
            third = (buf[n - 3] as u32) << 9;
            fourth = (buf[n - 2] as u32) << 14;
            fifth = (buf[n - 1] as u32) << 24;
        }
        3 => {
            second = (buf[1] as u32) << 4;
            third = (buf[2] as u32) << 9;
        }
        2 => {
            second = (buf[1] as u32) << 24;
        }
        _ => {}
    }

    len.wrapping_add(first)
        .wrapping_add(second)
        .wrapping_add(third)
        .wrapping_add(fourth)
        .wrapping_add(fifth)
}

fn variant(name: &str) -> Ident {
    format_ident!("{}", name.to_ascii_uppercase().replace('-', "_"))
}

/// Lays a sorted slice out as a complete binary search tree in level order.
fn level_order<T: Copy>(sorted: &[T]) -> Vec<T> {
    fn fill<T: Copy>(i: usize, items: &mut std::slice::Iter<'_, T>, out: &mut [Option<T>]) {
        if i >= out.len() {
            return;
        }
        fill(2 * i + 1, items, out);
        out[i] = items.next().copied();
        fill(2 * i + 2, items, out);
    }

    let mut out = vec![None; sorted.len()];
    fill(0, &mut sorted.iter(), &mut out);
    out.into_iter().flatten().collect()
}

fn expand(input: &LitStr) -> syn::Result<proc_macro2::TokenStream> {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .unwrap_or_default();
    let path = manifest_dir.join(input.value());
    let error = |message: String| syn::Error::new(input.span(), message);

    let json = fs::read_to_string(&path)
        .map_err(|e| error(format!("Failed to read {}: {e}", path.display())))?;
    let vocabulary: Vocabulary = serde_json::from_str(&json)
        .map_err(|e| error(format!("Failed to parse {}: {e}", path.display())))?;

    let all: Vec<&Entry> = vocabulary
        .html
        .iter()
        .chain(&vocabulary.mathml)
        .chain(&vocabulary.svg)
        .collect();

    // Duplicate names collide with themselves.
    let mut seen: HashMap<u32, &str> = HashMap::new();
    for entry in &all {
        if entry.name.is_empty() {
            return Err(error("empty element name".to_owned()));
        }
        if let Some(previous) = seen.insert(name_hash(entry.name.as_bytes()), &entry.name) {
            return Err(error(if previous == entry.name {
                format!("duplicate element name: {previous}")
            } else {
                format!("hash collision: {} / {previous}", entry.name)
            }));
        }
    }

    let mut sorted = all.clone();
    sorted.sort_by_key(|entry| name_hash(entry.name.as_bytes()));
    let tree = level_order(&sorted);

    let variants: Vec<Ident> = all.iter().map(|entry| variant(&entry.name)).collect();
    let names = all.iter().map(|entry| entry.name.as_str());

    let entries = tree.iter().map(|entry| {
        let name = entry.name.as_str();
        let camel = entry.camel.as_deref().unwrap_or(name);
        let tag_name = variant(name);
        let group = format_ident!("{}", entry.group);
        let flags = entry.flags.iter().map(|flag| format_ident!("{}", flag));
        quote! {
            ElementName {
                name: Atom::Static(#name),
                camel_case_name: Atom::Static(#camel),
                tag_name: TagName::#tag_name,
                group: DispatchGroup::#group,
                flags: ElementFlags::from_bits(0 #(| ElementFlags::#flags.bits())*),
            }
        }
    });
    let hashes = tree.iter().map(|entry| name_hash(entry.name.as_bytes()));
    let len = tree.len();
    let path_str = path.to_string_lossy().to_string();

    Ok(quote! {
        // Rebuild when the data file changes.
        const _: &str = include_str!(#path_str);

        /// Every element name known to the dispatch table.
        ///
        /// `UNKNOWN` stands for any name outside the vocabulary.
        #[allow(non_camel_case_types)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum TagName {
            #(#variants,)*
            UNKNOWN,
        }

        impl TagName {
            pub fn as_str(&self) -> &'static str {
                match self {
                    #(TagName::#variants => #names,)*
                    TagName::UNKNOWN => "",
                }
            }
        }

        pub(super) static ELEMENT_NAMES: [ElementName; #len] = [#(#entries),*];

        /// Hashes of `ELEMENT_NAMES`, in the same level order.
        pub(super) static ELEMENT_HASHES: [u32; #len] = [#(#hashes),*];
    })
}

#[proc_macro]
pub fn element_names(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as LitStr);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(error) => error.to_compile_error().into(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn level_order_is_a_search_tree() {
        let sorted: Vec<u32> = (1..=10).collect();
        let tree = level_order(&sorted);
        assert_eq!(vec![7, 4, 9, 2, 6, 8, 10, 1, 3, 5], tree);
    }

    #[test]
    fn short_names_hash_apart() {
        assert_ne!(name_hash(b"a"), name_hash(b"b"));
        assert_ne!(name_hash(b"dd"), name_hash(b"dt"));
        assert_eq!(0, name_hash(b""));
    }
}
