//! Wire-level constants: instruction bytes, status words, and the fixed
//! templates the dispatcher and handlers need to agree on.

/// Two-byte ISO-7816 status word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusWord(pub u8, pub u8);

impl StatusWord {
    pub const SUCCESS: StatusWord = StatusWord(0x90, 0x00);
    pub const SECURITY_FAILURE: StatusWord = StatusWord(0x69, 0x82);
    pub const AUTH_BLOCKED: StatusWord = StatusWord(0x69, 0x83);
    pub const MEMORY_FAILURE: StatusWord = StatusWord(0x65, 0x81);
    pub const NO_RECORD: StatusWord = StatusWord(0x6A, 0x83);
    pub const NO_FILE: StatusWord = StatusWord(0x6A, 0x82);
    pub const BAD_P0_P1: StatusWord = StatusWord(0x6B, 0x00);
    pub const WRONG_INS: StatusWord = StatusWord(0x6D, 0x00);
    pub const GENERIC_ERROR: StatusWord = StatusWord(0x6F, 0x00);

    pub fn as_bytes(&self) -> [u8; 2] {
        [self.0, self.1]
    }
}

/// Instruction byte dispatch table. Unknown values fall back to
/// `Opcode::Unknown` so an unrecognized INS is a data value to match on,
/// not a panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, num_derive::FromPrimitive, num_derive::ToPrimitive)]
pub enum Ins {
    Verify = 0x20,
    ChangeReferenceData = 0x24,
    Pso = 0x2A,
    ResetRetryCounter = 0x2C,
    GenerateAsymKeyPair = 0x47,
    InternalAuthenticate = 0x88,
    SelectFile = 0xA4,
    ReadBinary = 0xB0,
    GetData = 0xCA,
    PutData = 0xDA,
    PutDataOdd = 0xDB,
}

impl Ins {
    pub fn from_byte(b: u8) -> Option<Ins> {
        num_traits::FromPrimitive::from_u8(b)
    }
}

/// Which ISO-7816 "file" is currently selected. Controls which commands
/// are valid; persists across commands but not across reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectedFile {
    #[default]
    None,
    Mf,
    DfOpenpgp,
    EfDir,
    EfSerial,
}

/// The literal 16-byte SELECT-MF FCI template from spec.md section 6.
/// Bytes at offsets 2-3 are patched with the current DO-store size
/// (little-endian) before transmission; everything else is transmitted
/// as-is. Modeled as an immutable constant plus a patch step rather than
/// mutated in place, per the spec's design notes.
pub const MF_TEMPLATE: [u8; 16] = [
    0x00, 0x00, 0x3F, 0x00, 0x38, 0xFF, 0xFF, 0x44, 0x44, 0x01, 0x05, 0x03, 0x01, 0x01, 0x00, 0x00,
];

/// Patches the MF FCI template with the current DO-store size, little-endian,
/// at offsets 2-3.
pub fn patch_mf_template(total_do_bytes: u16) -> [u8; 16] {
    let mut out = MF_TEMPLATE;
    let [lo, hi] = total_do_bytes.to_le_bytes();
    out[2] = lo;
    out[3] = hi;
    out
}

/// RID prefix for the OpenPGP application, per spec.md section 6.
pub const OPENPGP_RID: [u8; 6] = [0xD2, 0x76, 0x00, 0x01, 0x24, 0x01];

/// Factory-default PW1, assumed when no PW1 keystring record has been
/// written yet.
pub const FACTORY_PW1: &[u8] = b"123456";

/// Payload bytes of the EF_SERIAL selector (`2F 02`, see spec.md section 4.2).
pub const EF_SERIAL_SELECTOR: [u8; 2] = [0x2F, 0x02];
/// Payload bytes of the MF selector (`3F 00`, see spec.md section 4.2).
pub const MF_SELECTOR: [u8; 2] = [0x3F, 0x00];

/// Internal (non-protocol) DO-store tag namespace: reserved so that
/// GET DATA / PUT DATA traffic from the host (arbitrary 16-bit tags) can
/// never collide with the credential/key bookkeeping the core keeps for
/// itself. See DESIGN.md for the reservation rationale.
pub mod internal_tags {
    pub const PW1_RECORD: u16 = 0xA101;
    pub const RC_RECORD: u16 = 0xA102;
    pub const PW3_RECORD: u16 = 0xA103;
}

/// OpenPGP Card v2 digital-signature counter DO, readable through the
/// generic GET DATA path (see spec.md section B.2 of SPEC_FULL.md).
pub const SIG_COUNTER_TAG: u16 = 0x0093;
