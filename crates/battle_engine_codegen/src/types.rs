//! Type enum and type chart generation.

use crate::helpers::to_valid_ident;
use crate::models::TypeChartEntry;
use heck::ToPascalCase;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Generate Type enum and type chart
pub fn generate(out_dir: &Path, data_dir: &Path) {
    let json = fs::read_to_string(data_dir.join("typechart.json")).expect("typechart.json");
    let chart: BTreeMap<String, TypeChartEntry> =
        serde_json::from_str(&json).expect("parse typechart");

    // Canonical type order (alphabetical, matching JSON keys)
    let type_names: Vec<&str> = chart.keys().map(|s| s.as_str()).collect();
    let type_count = type_names.len();

    let variants: Vec<TokenStream> = type_names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let ident = format_ident!("{}", to_valid_ident(name));
            let idx = i as u8;
            quote! { #ident = #idx }
        })
        .collect();

    let all_entries: Vec<TokenStream> = type_names
        .iter()
        .map(|name| {
            let ident = format_ident!("{}", to_valid_ident(name));
            quote! { Type::#ident }
        })
        .collect();

    let name_arms: Vec<TokenStream> = type_names
        .iter()
        .map(|name| {
            let ident = format_ident!("{}", to_valid_ident(name));
            let lower = name.to_lowercase();
            quote! { Type::#ident => #lower }
        })
        .collect();

    // Matrix[defender][attacker] = damage code
    let mut matrix: Vec<Vec<u8>> = vec![vec![0; type_count]; type_count];
    for (def_idx, def_name) in type_names.iter().enumerate() {
        let entry = &chart[*def_name];
        for (atk_idx, atk_name) in type_names.iter().enumerate() {
            let atk_pascal = atk_name.to_pascal_case();
            let code = entry.damage_taken.get(&atk_pascal).copied().unwrap_or(0);
            matrix[def_idx][atk_idx] = code;
        }
    }

    let matrix_rows: Vec<TokenStream> = matrix
        .iter()
        .map(|row| {
            let cells: Vec<TokenStream> = row
                .iter()
                .map(|&v| {
                    let ident = match v {
                        1 => format_ident!("SuperEffective"),
                        2 => format_ident!("Resistant"),
                        3 => format_ident!("Immune"),
                        _ => format_ident!("Normal"),
                    };
                    quote! { TypeEffectiveness::#ident }
                })
                .collect();
            quote! { [#(#cells),*] }
        })
        .collect();

    let code = quote! {
        /// Elemental type of a creature or move.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u8)]
        pub enum Type {
            #(#variants),*
        }

        impl Type {
            /// Total number of types
            pub const COUNT: usize = #type_count;

            /// Every type, in chart order
            pub const ALL: [Type; #type_count] = [#(#all_entries),*];

            /// Parse type from string (case-insensitive)
            #[inline]
            pub fn from_str(s: &str) -> Option<Self> {
                TYPE_LOOKUP.get(s.to_ascii_lowercase().as_str()).copied()
            }

            /// Lowercase catalog name of the type
            #[inline]
            pub const fn name(self) -> &'static str {
                match self {
                    #(#name_arms,)*
                }
            }
        }

        /// Type effectiveness of one attacking type against one defending type
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        #[repr(u8)]
        pub enum TypeEffectiveness {
            /// 1.0x damage
            Normal = 0,
            /// 2.0x damage
            SuperEffective = 1,
            /// 0.5x damage
            Resistant = 2,
            /// 0.0x damage (immune)
            Immune = 3,
        }

        impl TypeEffectiveness {
            /// Damage multiplier for this matchup
            #[inline]
            pub const fn multiplier(self) -> f64 {
                match self {
                    Self::Normal => 1.0,
                    Self::SuperEffective => 2.0,
                    Self::Resistant => 0.5,
                    Self::Immune => 0.0,
                }
            }
        }

        /// Type chart: TYPE_CHART[defender][attacker] = effectiveness
        pub static TYPE_CHART: [[TypeEffectiveness; #type_count]; #type_count] = [
            #(#matrix_rows),*
        ];

        /// Look up a single attacker/defender matchup
        #[inline]
        pub fn type_effectiveness(attacker: Type, defender: Type) -> TypeEffectiveness {
            TYPE_CHART[defender as usize][attacker as usize]
        }
    };

    let mut phf_map = phf_codegen::Map::new();
    for name in &type_names {
        let ident = to_valid_ident(name);
        phf_map.entry(*name, &format!("Type::{}", ident));
    }
    let phf_str = phf_map.build().to_string();

    let dest = out_dir.join("types.rs");
    let mut file = BufWriter::new(File::create(&dest).expect("create types.rs"));
    writeln!(file, "{}", code).expect("write types.rs");
    writeln!(file).expect("write types.rs");
    writeln!(
        file,
        "static TYPE_LOOKUP: phf::Map<&'static str, Type> = {};",
        phf_str
    )
    .expect("write types.rs");
}
