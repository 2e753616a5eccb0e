use std::fs;

use crate::dex::checksum;
use crate::dex::class_data::AccessFlags;
use crate::dex::{DexFile, ErrorKind};
use crate::hollow::{hollow_file, hollow_method, HollowRequest};
use crate::query::MethodQuery;
use crate::tests::fixture::{sample_dex, ROOTED_INSNS};

fn query(s: &str) -> MethodQuery {
    s.parse().expect("valid query")
}

#[test]
fn loads_index_tables() {
    let dex = DexFile::from_bytes(&sample_dex()).expect("parse sample dex");
    let tables = dex.tables();

    assert_eq!(tables.methods().len(), 7);
    assert_eq!(tables.class_defs().len(), 4);
    assert_eq!(tables.fields().len(), 1);
    assert!(tables.type_names().iter().any(|t| t == "Lcom/example/Caf\u{e9};"));
    assert_eq!(tables.shorty(tables.methods()[3].proto_idx), Some("ZLI"));
    assert_eq!(
        dex.method_descriptor(3).as_deref(),
        Some("Lcom/example/RootCheck;->check(Ljava/lang/String;I)Z")
    );
    assert_eq!(tables.class_defs()[2].superclass_idx, None);
    assert_eq!(tables.class_defs()[2].class_data_off, 0);
    assert_eq!(dex.header().version(), 35);
    assert!(dex.verify_integrity().unwrap().is_valid());
}

#[test]
fn walks_direct_and_virtual_methods() {
    let dex = DexFile::from_bytes(&sample_dex()).unwrap();

    let root = dex.class_data(0).expect("RootCheck has class data");
    assert_eq!(root.static_fields_size, 1);
    let direct: Vec<_> = root.direct_methods.iter().map(|m| m.method_idx).collect();
    let virt: Vec<_> = root.virtual_methods.iter().map(|m| m.method_idx).collect();
    assert_eq!(direct, vec![0, 1]);
    assert_eq!(virt, vec![2, 3]);
    assert!(root.direct_methods[0].access_flags.contains(AccessFlags::CONSTRUCTOR));

    assert!(dex.class_data(2).is_none());

    assert_eq!(dex.code(2).unwrap().insns, ROOTED_INSNS.to_vec());
    assert_eq!(dex.code(2).unwrap().header().debug_info_off, 0x2ab4);
    assert_eq!(dex.code(6).unwrap().insns, vec![0x000e]);
    assert!(dex.code(4).is_none());
    assert!(dex.code(5).is_none());
    assert!(dex.code(99).is_none());
}

#[test]
fn resolves_methods_by_triple() {
    let dex = DexFile::from_bytes(&sample_dex()).unwrap();

    assert_eq!(dex.find_method("Lcom/example/RootCheck;", "isRooted", "Z"), Some(2));
    assert_eq!(dex.find_method("Lcom/example/RootCheck;", "isRooted", "V"), None);
    assert_eq!(dex.find_method("Lcom/example/Probe;", "isRooted", "Z"), None);
    assert_eq!(dex.find(&query("com.example.Caf\u{e9}->run:V")), Some(6));
    assert_eq!(dex.find(&query("Lcom/example/Probe;->nativeProbe:VJ")), Some(5));
}

#[test]
fn unmodified_save_reproduces_input() {
    let input = sample_dex();
    let mut dex = DexFile::from_bytes(&input).unwrap();
    assert_eq!(dex.to_bytes().unwrap(), input);

    // Touching a block without changing it writes identical bytes back.
    dex.code_mut(3).unwrap();
    assert_eq!(dex.to_bytes().unwrap(), input);
}

#[test]
fn hollows_method_end_to_end() {
    let input = sample_dex();
    let mut dex = DexFile::from_bytes(&input).unwrap();

    let hollowed = hollow_method(&mut dex, &query("Lcom/example/RootCheck;->isRooted:Z")).unwrap();
    assert_eq!(hollowed.method_idx, 2);
    assert_eq!(hollowed.descriptor, "Lcom/example/RootCheck;->isRooted()Z");
    assert_eq!(hollowed.original.insns, ROOTED_INSNS.to_vec());

    // aux record: debug_info_off, insns_size, then the original units
    let aux = &hollowed.aux_record;
    assert_eq!(aux.len(), 8 + 2 * ROOTED_INSNS.len());
    assert_eq!(&aux[0..4], &0x2ab4u32.to_le_bytes());
    assert_eq!(&aux[4..8], &8u32.to_le_bytes());
    assert_eq!(&aux[8..10], &[0x34, 0x12]);
    assert_eq!(&aux[10..12], &[0x78, 0x56]);

    let output = dex.to_bytes().unwrap();
    assert_eq!(output.len(), input.len());

    let insns_start = hollowed.original.offset() + 16;
    let insns_end = insns_start + 2 * ROOTED_INSNS.len();
    assert!(output[insns_start..insns_end].iter().all(|&b| b == 0));
    for (i, (a, b)) in input.iter().zip(output.iter()).enumerate() {
        if (8..32).contains(&i) || (insns_start..insns_end).contains(&i) {
            continue;
        }
        assert_eq!(a, b, "byte 0x{:x} changed", i);
    }

    assert_ne!(&output[8..12], &input[8..12]);
    assert_ne!(&output[12..32], &input[12..32]);
    assert!(checksum::verify(&output).unwrap().is_valid());

    let reparsed = DexFile::from_bytes(&output).unwrap();
    assert_eq!(reparsed.code(2).unwrap().insns, vec![0u16; 8]);
    assert_eq!(reparsed.code(3).unwrap().insns, dex.code(3).unwrap().insns);
    assert_eq!(reparsed.code(2).unwrap().header(), hollowed.original.header());
}

#[test]
fn lookup_failures_leave_file_untouched() {
    let input = sample_dex();
    let mut dex = DexFile::from_bytes(&input).unwrap();

    let e = hollow_method(&mut dex, &query("Lcom/example/Probe;->probe:Z")).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::MethodHasNoCode);
    assert!(e.is_lookup_failure());

    let e = hollow_method(&mut dex, &query("Lcom/example/Probe;->missing:Z")).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::MethodNotFound);
    assert!(e.is_lookup_failure());

    assert_eq!(dex.to_bytes().unwrap(), input);
}

#[test]
fn set_code_keeps_length() {
    let mut dex = DexFile::from_bytes(&sample_dex()).unwrap();

    assert_eq!(dex.set_code(3, vec![0x0112]).unwrap_err().kind(), ErrorKind::CodeSizeMismatch);
    assert_eq!(dex.set_code(4, vec![]).unwrap_err().kind(), ErrorKind::MethodHasNoCode);
    assert_eq!(dex.set_code(40, vec![]).unwrap_err().kind(), ErrorKind::MethodNotFound);

    dex.set_code(3, vec![0x0112, 0x000f]).unwrap();
    let reparsed = DexFile::from_bytes(&dex.to_bytes().unwrap()).unwrap();
    assert_eq!(reparsed.code(3).unwrap().insns, vec![0x0112, 0x000f]);
    assert_eq!(reparsed.code(2).unwrap().insns, ROOTED_INSNS.to_vec());
}

#[test]
fn integrity_recompute_twice_is_stable() {
    let mut dex = DexFile::from_bytes(&sample_dex()).unwrap();
    dex.code_mut(6).unwrap().zero();
    let once = dex.to_bytes().unwrap();
    let mut twice = once.clone();
    checksum::recompute(&mut twice).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn stale_integrity_fields_still_load() {
    let mut input = sample_dex();
    input[8..32].fill(0);
    let dex = DexFile::from_bytes(&input).unwrap();
    assert!(!dex.verify_integrity().unwrap().is_valid());
    assert!(checksum::verify(&dex.to_bytes().unwrap()).unwrap().is_valid());
}

#[test]
fn hollows_files_on_disk() {
    let dir = std::env::temp_dir().join(format!("dexhollow-test-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let request = HollowRequest {
        input: dir.join("classes.dex"),
        output: dir.join("classes.out.dex"),
        aux_output: dir.join("isRooted.code"),
        query: query("Lcom/example/RootCheck;->isRooted:Z"),
    };
    fs::write(&request.input, sample_dex()).unwrap();

    let hollowed = hollow_file(&request).unwrap();
    assert_eq!(fs::read(&request.aux_output).unwrap(), hollowed.aux_record);
    let out = DexFile::from_file(&request.output).unwrap();
    assert!(out.verify_integrity().unwrap().is_valid());
    assert!(out.code(2).unwrap().insns.iter().all(|&u| u == 0));

    // A failed lookup writes nothing.
    let missing = HollowRequest {
        output: dir.join("never.dex"),
        aux_output: dir.join("never.code"),
        query: query("Lcom/example/RootCheck;->nope:V"),
        ..request.clone()
    };
    assert_eq!(hollow_file(&missing).unwrap_err().kind(), ErrorKind::MethodNotFound);
    assert!(!missing.output.exists());
    assert!(!missing.aux_output.exists());

    let e = DexFile::from_file(&dir.join("does-not-exist.dex")).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::Io);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn failed_write_leaves_no_outputs() {
    let dir = std::env::temp_dir().join(format!("dexhollow-unwritable-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let input = dir.join("classes.dex");
    fs::write(&input, sample_dex()).unwrap();

    // The dex output cannot be created, the aux output could.
    let request = HollowRequest {
        input: input.clone(),
        output: dir.join("no-such-dir").join("out.dex"),
        aux_output: dir.join("isRooted.code"),
        query: query("Lcom/example/RootCheck;->isRooted:Z"),
    };
    assert_eq!(hollow_file(&request).unwrap_err().kind(), ErrorKind::Io);
    assert!(!request.aux_output.exists());
    assert!(!dir.join("isRooted.code.part").exists());

    // And the other way round.
    let request = HollowRequest {
        output: dir.join("out.dex"),
        aux_output: dir.join("no-such-dir").join("isRooted.code"),
        ..request
    };
    assert_eq!(hollow_file(&request).unwrap_err().kind(), ErrorKind::Io);
    assert!(!request.output.exists());
    assert!(!dir.join("out.dex.part").exists());

    fs::remove_dir_all(&dir).unwrap();
}
