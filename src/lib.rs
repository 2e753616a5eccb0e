//! # Dexhollow
//!
//! A library for pulling the code of a single method out of an Android dex file and replacing
//! it with nops, rewriting the file's checksum and signature afterwards.
//!
//! ```no_run
//!  use dexhollow::dex::DexFile;
//!  use dexhollow::hollow::hollow_method;
//!  use dexhollow::query::MethodQuery;
//!  use std::path::Path;
//!
//!  let mut dex = DexFile::from_file(Path::new("classes.dex")).unwrap();
//!  let query: MethodQuery = "Lcom/example/Check;->isRooted:Z".parse().unwrap();
//!  let hollowed = hollow_method(&mut dex, &query).unwrap();
//!  std::fs::write("isRooted.code", &hollowed.aux_record).unwrap();
//!  dex.save(Path::new("classes.hollow.dex")).unwrap();
//! ```
#[macro_use]
pub mod dex;
pub mod hollow;
pub mod query;
mod tests;
