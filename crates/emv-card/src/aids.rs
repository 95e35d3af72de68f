//! Known EMV Application Identifiers (AIDs)

/// PSE (Payment System Environment), contact directory
pub const PSE: &[u8] = b"1PAY.SYS.DDF01";

/// PPSE (Proximity Payment System Environment), contactless directory
pub const PPSE: &[u8] = b"2PAY.SYS.DDF01";

/// Visa
pub const VISA: &[u8] = &[0xA0, 0x00, 0x00, 0x00, 0x03, 0x10, 0x10];

/// Mastercard
pub const MASTERCARD: &[u8] = &[0xA0, 0x00, 0x00, 0x00, 0x04, 0x10, 0x10];

/// American Express
pub const AMEX: &[u8] = &[0xA0, 0x00, 0x00, 0x00, 0x25, 0x00, 0x00];

/// Payment AIDs probed when a card exposes no directory
pub const REFERENCE_AIDS: &[(&str, &str)] = &[
    ("A0000000031010", "Visa credit or debit"),
    ("A000000003101001", "Visa credit"),
    ("A000000003101002", "Visa debit"),
    ("A0000000032010", "Visa Electron"),
    ("A0000000032020", "V Pay"),
    ("A0000000033010", "Visa Interlink"),
    ("A0000000034010", "Visa specific"),
    ("A0000000035010", "Visa specific"),
    ("A0000000036010", "Domestic Visa Cash stored value"),
    ("A0000000036020", "International Visa Cash stored value"),
    ("A0000000038002", "Barclays/HBOS"),
    ("A0000000038010", "Visa Plus"),
    ("A0000000039010", "Visa loyalty"),
    ("A000000003999910", "Visa ATM"),
    ("A000000004", "US debit (Mastercard)"),
    ("A0000000041010", "Mastercard credit or debit"),
    ("A00000000410101213", "Mastercard"),
    ("A00000000410101215", "Mastercard"),
    ("A0000000042010", "Mastercard specific"),
    ("A0000000043010", "Mastercard specific"),
    ("A0000000043060", "Maestro"),
    ("A0000000044010", "Mastercard specific"),
    ("A0000000045010", "Mastercard specific"),
    ("A0000000046000", "Cirrus"),
    ("A0000000048002", "NatWest or SecureCode auth"),
    ("A0000000049999", "Mastercard"),
    ("A0000000050001", "UK domestic Maestro (Switch)"),
    ("A0000000050002", "UK domestic Maestro (Solo)"),
    ("A0000000250000", "American Express credit/debit"),
    ("A00000002501", "American Express"),
    ("A000000025010402", "American Express"),
    ("A000000025010701", "American Express ExpressPay"),
    ("A000000025010801", "American Express"),
    ("A0000000291010", "LINK ATM network (UK)"),
    ("A0000000421010", "Cartes Bancaires"),
    ("A0000000422010", "Cartes Bancaires"),
    ("A00000006510", "JCB"),
    ("A0000000651010", "JCB"),
    ("A00000006900", "Moneo (FR)"),
    ("A000000098", "US debit (Visa)"),
    ("A0000000980848", "Schwab Bank debit"),
    ("A0000001211010", "Dankort"),
    ("A0000001410001", "Pagobancomat"),
    ("A000000152", "US debit (Discover)"),
    ("A0000001523010", "Diners Club/Discover"),
    ("A0000001544442", "Banricompras debito (BR)"),
    ("A0000001850002", "UK Post Office Card Account"),
    ("A0000002281010", "SAMA (SA)"),
    ("A0000002282010", "SAMA (SA)"),
    ("A0000002771010", "Interac"),
    ("A0000003156020", "Chipknip"),
    ("A0000003241010", "Discover"),
    ("A0000003591010028001", "girocard (DE)"),
    ("A0000003710001", "Verve (NG)"),
    ("A0000004540010", "Etranzact Genesis (NG)"),
    ("A0000004540011", "Etranzact Genesis 2 (NG)"),
    ("A0000004766C", "Google"),
    ("A0000005241010", "RuPay (IN)"),
    ("A000000620", "US debit (DNA)"),
    ("D27600002545500100", "girocard (DE)"),
    ("D5780000021010", "BankAxept (NO)"),
];

/// Decoded reference AIDs, in probe order
pub fn reference_aids() -> Vec<Vec<u8>> {
    REFERENCE_AIDS
        .iter()
        .filter_map(|(aid, _)| hex::decode(aid).ok())
        .collect()
}

/// Description of a reference AID, if known
pub fn describe(aid: &[u8]) -> Option<&'static str> {
    let wanted = hex::encode_upper(aid);
    REFERENCE_AIDS
        .iter()
        .find(|(hex_aid, _)| *hex_aid == wanted)
        .map(|(_, name)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aids() {
        assert_eq!(VISA.len(), 7);
        assert_eq!(MASTERCARD.len(), 7);
        assert_eq!(PSE, b"1PAY.SYS.DDF01");
    }

    #[test]
    fn test_reference_aids_decode() {
        let aids = reference_aids();
        assert_eq!(aids.len(), REFERENCE_AIDS.len());
        assert!(aids.iter().all(|aid| (5..=16).contains(&aid.len())));
        assert_eq!(aids[0], VISA);
    }

    #[test]
    fn test_describe() {
        assert_eq!(describe(MASTERCARD), Some("Mastercard credit or debit"));
        assert_eq!(describe(&[0x01, 0x02]), None);
    }
}
