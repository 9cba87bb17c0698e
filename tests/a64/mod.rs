use bitdis::isa::machine::{InstructionRecord, SystemRegisterRecord};
use bitdis::{BitField, DecodeOptions, Disassembler};

fn system_transfer(name: &str, l: &str, template: &str) -> InstructionRecord {
    InstructionRecord {
        name: name.into(),
        fields: vec![
            BitField::fixed(31, 10, "1101010100"),
            BitField::named(21, 1, "L").with_fixed(l),
            BitField::fixed(20, 1, "1"),
            BitField::named(19, 1, "o0"),
            BitField::named(18, 3, "op1"),
            BitField::named(15, 4, "CRn"),
            BitField::named(11, 4, "CRm"),
            BitField::named(7, 3, "op2"),
            BitField::named(4, 5, "Rt"),
        ],
        template: template.into(),
        ..Default::default()
    }
}

pub fn instructions() -> Vec<InstructionRecord> {
    vec![
        system_transfer(
            "MSR_reg",
            "0",
            "MSR  (<systemreg>|S<op0>_<op1>_<Cn>_<Cm>_<op2>), <Xt>",
        ),
        system_transfer(
            "MRS",
            "1",
            "MRS  <Xt>, (<systemreg>|S<op0>_<op1>_<Cn>_<Cm>_<op2>)",
        ),
        InstructionRecord {
            name: "NOP".into(),
            fields: vec![BitField::fixed(31, 32, "11010101000000110010000000011111")],
            template: "NOP".into(),
            ..Default::default()
        },
        InstructionRecord {
            name: "SUB_addsub_imm".into(),
            fields: vec![
                BitField::named(31, 1, "sf"),
                BitField::fixed(30, 8, "10100010"),
                BitField::named(22, 1, "sh").with_fixed("0"),
                BitField::named(21, 12, "imm12"),
                BitField::named(9, 5, "Rn"),
                BitField::named(4, 5, "Rd"),
            ],
            template: "SUB  <Xd>, <Xn>, #<imm12>".into(),
            ..Default::default()
        },
    ]
}

pub fn system_registers() -> Vec<SystemRegisterRecord> {
    vec![
        SystemRegisterRecord {
            name: Some("ICH_LR<n>_EL2".into()),
            op0: Some("11".into()),
            op1: "100".into(),
            crn: "1100".into(),
            crm: "110x".into(),
            op2: "xxx".into(),
        },
        SystemRegisterRecord {
            name: Some("TPIDR_EL0".into()),
            op0: Some("11".into()),
            op1: "011".into(),
            crn: "1101".into(),
            crm: "0000".into(),
            op2: "010".into(),
        },
    ]
}

pub fn disassembler(options: DecodeOptions) -> Disassembler {
    Disassembler::from_records(instructions(), system_registers(), options)
        .expect("compile A64 fixture tables")
}
