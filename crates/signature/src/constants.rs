/// Class bytes
pub mod cla {
    /// Interindustry class without secure messaging
    pub const ISO7816: u8 = 0x00;
}

/// Instruction bytes (ISO/IEC 7816-4 and 7816-8)
pub mod ins {
    /// MANAGE SECURITY ENVIRONMENT
    pub const MANAGE_SECURITY_ENVIRONMENT: u8 = 0x22;
    /// PERFORM SECURITY OPERATION
    pub const PERFORM_SECURITY_OPERATION: u8 = 0x2A;
    /// INTERNAL AUTHENTICATE
    pub const INTERNAL_AUTHENTICATE: u8 = 0x88;
}

/// MANAGE SECURITY ENVIRONMENT P1 values
pub mod mse {
    /// SET for computation, decipherment, internal authentication and key agreement
    pub const SET_COMPUTATION: u8 = 0x41;
    /// RESTORE a stored environment
    pub const RESTORE: u8 = 0xF3;
}

/// Control reference templates, used as MSE P2
pub mod crt {
    /// Authentication template
    pub const AT: u8 = 0xA4;
    /// Hash-code template
    pub const HT: u8 = 0xAA;
    /// Digital signature template
    pub const DST: u8 = 0xB6;
}

/// PERFORM SECURITY OPERATION P1-P2 pairs
pub mod pso {
    /// COMPUTE DIGITAL SIGNATURE: P1
    pub const CDS_P1: u8 = 0x9E;
    /// COMPUTE DIGITAL SIGNATURE: P2
    pub const CDS_P2: u8 = 0x9A;
    /// HASH: P1
    pub const HASH_P1: u8 = 0x90;
    /// HASH: data field is the message to be hashed
    pub const HASH_MESSAGE: u8 = 0x80;
    /// HASH: data field is a hash code or the last round input
    pub const SET_HASH_OR_PART: u8 = 0xA0;
}

/// Data object tags in MSE data fields
pub mod tags {
    /// Cryptographic mechanism reference (algorithm identifier)
    pub const ALGORITHM_REFERENCE: u8 = 0x80;
    /// Reference of a private key
    pub const PRIVATE_KEY_REFERENCE: u8 = 0x84;
}

/// Bit set in the first key reference byte for DIDs with local scope
pub const LOCAL_KEY_REFERENCE: u8 = 0x80;

/// Legacy output format re-encoding a plain `r || s` ECDSA signature as DER
pub const OUTPUT_FORMAT_RAW_RS: &str = "rawRS";
