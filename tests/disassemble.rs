mod a64;

use std::sync::Arc;
use std::thread;

use hex_literal::hex;

use bitdis::isa::machine::{InstructionTable, SystemRegisterTable};
use bitdis::{DecodeOptions, Disassembler, IsaError};

#[test]
fn disassembles_little_endian_stream() {
    let disassembler = a64::disassembler(DecodeOptions::default());
    let stream = hex!(
        "02cc1cd5" // MSR ICH_LR<n>_EL2, X2
        "02cc3cd5" // MRS X2, ICH_LR<n>_EL2
        "40d03bd5" // MRS X0, TPIDR_EL0
        "00000000" // udf
        "1f2003d5" // NOP
        "e1030ad1" // SUB X1, SP, #0x280
        "1f20"
    );
    let listing = disassembler.disassemble_bytes(&stream, 0x4000);
    assert_eq!(listing.len(), 6, "trailing half word is dropped");

    if std::env::var_os("SHOW_DISASM").is_some() {
        eprintln!("A64 listing:");
        for entry in &listing {
            if entry.is_unmatched() {
                eprintln!("  {:08x}:{:08x} <undefined>", entry.address, entry.word);
            }
            for line in entry.lines() {
                eprintln!("  {line}");
            }
        }
    }

    let lines: Vec<Vec<String>> = listing.iter().map(|entry| entry.lines().collect()).collect();
    assert_eq!(lines[0], ["00004000:d51ccc02 MSR ICH_LR[n]_EL2, R2"]);
    assert_eq!(lines[1], ["00004004:d53ccc02 MRS R2, ICH_LR[n]_EL2"]);
    assert_eq!(lines[2], ["00004008:d53bd040 MRS R0, TPIDR_EL0"]);
    assert!(listing[3].is_unmatched());
    assert_eq!(listing[3].address, 0x400c);
    assert_eq!(lines[4], ["00004010:d503201f NOP"]);
    assert_eq!(lines[5], ["00004014:d10a03e1 SUB  R1, R31, #640"]);
}

#[test]
fn tables_are_shared_between_disassemblers() {
    let instructions = Arc::new(InstructionTable::build(a64::instructions()).unwrap());
    let registers = Arc::new(SystemRegisterTable::build(a64::system_registers()).unwrap());
    let plain = Disassembler::new(
        Arc::clone(&instructions),
        Arc::clone(&registers),
        DecodeOptions::default(),
    )
    .unwrap();
    let prefixed = Disassembler::new(
        instructions,
        registers,
        DecodeOptions::default().with_register_prefix("X"),
    )
    .unwrap();
    assert!(Arc::ptr_eq(plain.instructions(), prefixed.instructions()));

    let word = 0xd53b_d040;
    assert_eq!(plain.decode_word(word, None)[0].text, "MRS R0, TPIDR_EL0");
    assert_eq!(prefixed.decode_word(word, None)[0].text, "MRS X0, TPIDR_EL0");
}

#[test]
fn decodes_from_many_threads() {
    let disassembler = Arc::new(a64::disassembler(DecodeOptions::default()));
    let words = [0xd51c_cc02u32, 0xd53c_cc02, 0xd503_201f, 0];
    let expected: Vec<_> = words
        .iter()
        .map(|word| disassembler.decode_word(*word, None))
        .collect();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let disassembler = Arc::clone(&disassembler);
            thread::spawn(move || {
                words
                    .iter()
                    .map(|word| disassembler.decode_word(*word, None))
                    .collect::<Vec<_>>()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn malformed_diagram_fails_the_table() {
    let mut records = a64::instructions();
    records[2].fields.push(bitdis::BitField::named(0, 1, "extra"));
    let err = Disassembler::from_records(records, a64::system_registers(), DecodeOptions::default())
        .unwrap_err();
    assert!(matches!(err, IsaError::MalformedPattern(msg) if msg.contains("'NOP'")));
}
