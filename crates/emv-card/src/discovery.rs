//! Application discovery
//!
//! Each payment directory (contact PSE, contactless PPSE) is read on its
//! own. Only when neither yields a candidate does the engine fall back to
//! probing the reference AID list.

use emv_common::{find_tag, parse_tlv, tags, TlvNode};
use tracing::{debug, info, warn};

use crate::aids::{PPSE, PSE};
use crate::apdu::commands;
use crate::error::Error;
use crate::session::CardSession;
use crate::status::StatusOutcome;
use crate::transport::{CardTransport, TransportError};

/// Valid AID lengths
const AID_LENGTHS: std::ops::RangeInclusive<usize> = 5..=16;

/// Payment directory kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Directory {
    Contact,
    Contactless,
}

impl Directory {
    pub const ALL: [Directory; 2] = [Directory::Contact, Directory::Contactless];

    /// DF name selected to open the directory
    pub fn name(&self) -> &'static [u8] {
        match self {
            Self::Contact => PSE,
            Self::Contactless => PPSE,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Contact => "PSE",
            Self::Contactless => "PPSE",
        }
    }
}

/// Outcome of reading one payment directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryResult {
    pub directory: Directory,
    /// FCI returned by the directory SELECT
    pub directory_fci: Option<Vec<u8>>,
    pub sfi: Option<u8>,
    /// Every directory record read successfully
    pub records: Vec<Vec<u8>>,
    /// AIDs named by the records, de-duplicated, in read order
    pub candidate_aids: Vec<Vec<u8>>,
    /// Local failure that ended this directory early
    pub failure: Option<Error>,
}

impl DiscoveryResult {
    fn new(directory: Directory) -> Self {
        Self {
            directory,
            directory_fci: None,
            sfi: None,
            records: Vec::new(),
            candidate_aids: Vec::new(),
            failure: None,
        }
    }
}

/// Where a candidate AID came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateSource {
    Directory(Directory),
    ReferenceList,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub aid: Vec<u8>,
    pub source: CandidateSource,
}

/// Combined discovery output for one card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    pub contact: DiscoveryResult,
    pub contactless: DiscoveryResult,
    /// Whether the reference AID list was probed
    pub brute_forced: bool,
    /// Candidates in processing order, unique by AID bytes
    pub candidates: Vec<Candidate>,
}

impl Discovery {
    pub fn directories(&self) -> [&DiscoveryResult; 2] {
        [&self.contact, &self.contactless]
    }
}

/// Run both directories, then the reference list if both came up empty
pub fn discover<T: CardTransport>(session: &mut CardSession<T>) -> Result<Discovery, TransportError> {
    let contact = discover_directory(session, Directory::Contact)?;
    let contactless = discover_directory(session, Directory::Contactless)?;

    let mut candidates = Vec::new();
    for result in [&contact, &contactless] {
        for aid in &result.candidate_aids {
            push_candidate(&mut candidates, aid, CandidateSource::Directory(result.directory));
        }
    }

    let brute_forced = candidates.is_empty() && session.config().brute_force;
    if brute_forced {
        info!("No payment directory found, probing reference AIDs");
        for aid in probe_reference_aids(session)? {
            push_candidate(&mut candidates, &aid, CandidateSource::ReferenceList);
        }
    }

    info!(count = candidates.len(), "Discovery complete");
    Ok(Discovery {
        contact,
        contactless,
        brute_forced,
        candidates,
    })
}

/// Read one payment directory.
///
/// Only a transport fault is returned as an error; everything else ends up
/// on the result.
pub fn discover_directory<T: CardTransport>(
    session: &mut CardSession<T>,
    directory: Directory,
) -> Result<DiscoveryResult, TransportError> {
    let mut result = DiscoveryResult::new(directory);

    if let Err(err) = read_directory(session, &mut result) {
        let err = err.into_local()?;
        warn!(directory = directory.label(), error = %err, "Directory discovery failed");
        result.failure = Some(err);
    }

    info!(
        directory = directory.label(),
        candidates = result.candidate_aids.len(),
        "Directory read"
    );
    Ok(result)
}

fn read_directory<T: CardTransport>(
    session: &mut CardSession<T>,
    result: &mut DiscoveryResult,
) -> Result<(), Error> {
    let name = result.directory.name();
    let mut response = session.select(name)?;

    if response.outcome() == StatusOutcome::ClassNotSupported {
        debug!(directory = result.directory.label(), "Class not supported, resetting and retrying");
        session.reset()?;
        response = session.select(name)?;
    }

    match response.outcome() {
        StatusOutcome::Success => {}
        StatusOutcome::NotFound => {
            debug!(directory = result.directory.label(), "Directory not present");
            return Ok(());
        }
        _ => return Err(Error::card_status("SELECT", response.status())),
    }

    let fci = response.data;
    result.directory_fci = Some(fci.clone());

    let nodes = parse_tlv(&fci)?;
    let Some(sfi) = locate_directory_sfi(&nodes)? else {
        debug!(directory = result.directory.label(), "FCI names no directory SFI");
        return Ok(());
    };
    result.sfi = Some(sfi);

    read_directory_records(session, sfi, result)
}

/// Find the directory SFI (tag `88`) in a decoded directory FCI.
///
/// The usual position is `6F` / second child / first child; any `88` inside
/// the FCI template is accepted otherwise.
pub fn locate_directory_sfi(nodes: &[TlvNode]) -> Result<Option<u8>, Error> {
    let root = match nodes.first() {
        Some(root) if root.tag == tags::FCI_TEMPLATE.0 => root,
        Some(root) => {
            return Err(Error::protocol_mismatch(
                "SELECT",
                format!("FCI starts with tag {}", root.tag),
            ))
        }
        None => return Err(Error::protocol_mismatch("SELECT", "empty FCI")),
    };

    let node = root
        .children
        .get(1)
        .and_then(|proprietary| proprietary.children.first())
        .filter(|node| node.tag == tags::SFI.0)
        .or_else(|| root.find(tags::SFI.0));

    match node.map(|node| node.value.as_slice()) {
        None => Ok(None),
        Some([sfi @ 1..=30]) => Ok(Some(*sfi)),
        Some(value) => Err(Error::protocol_mismatch(
            "SELECT",
            format!("invalid directory SFI {}", hex::encode_upper(value)),
        )),
    }
}

/// Enumerate directory records.
///
/// Record numbers up to the configured slack never count as misses, since
/// some cards start their entries at record 4 or 5. Past the slack, the
/// loop ends after the configured number of consecutive failed reads.
pub fn read_directory_records<T: CardTransport>(
    session: &mut CardSession<T>,
    sfi: u8,
    result: &mut DiscoveryResult,
) -> Result<(), Error> {
    let slack = session.config().directory_record_slack;
    let max_misses = session.config().directory_max_misses.max(1);
    let mut misses = 0u8;

    for record in 1..=u8::MAX {
        let response = session.read_record(sfi, record)?;

        if response.is_success() {
            misses = 0;
            for aid in directory_entry_aids(&response.data) {
                if AID_LENGTHS.contains(&aid.len()) {
                    if !result.candidate_aids.contains(&aid) {
                        info!(aid = %hex::encode_upper(&aid), record, "Found application");
                        result.candidate_aids.push(aid);
                    }
                } else {
                    warn!(aid = %hex::encode_upper(&aid), "Ignoring AID of invalid length");
                }
            }
            result.records.push(response.data);
        } else if record > slack {
            misses += 1;
            debug!(sfi, record, status = %response.status(), misses, "Directory record miss");
            if misses >= max_misses {
                break;
            }
        }
    }

    Ok(())
}

/// AIDs named in one directory record.
///
/// Every `4F` in the decoded record counts; a record that does not decode
/// falls back to a raw search for the first `4F`.
fn directory_entry_aids(record: &[u8]) -> Vec<Vec<u8>> {
    fn collect(nodes: &[TlvNode], out: &mut Vec<Vec<u8>>) {
        for node in nodes {
            if node.tag == tags::APPLICATION_IDENTIFIER.0 {
                out.push(node.value.clone());
            }
            collect(&node.children, out);
        }
    }

    let mut aids = Vec::new();
    if let Ok(nodes) = parse_tlv(record) {
        collect(&nodes, &mut aids);
    }
    if aids.is_empty() {
        if let Some(aid) = find_tag(record, tags::APPLICATION_IDENTIFIER.0) {
            aids.push(aid.to_vec());
        }
    }
    aids
}

/// SELECT every reference AID; any AID answering success or "more data"
/// is a candidate.
pub fn probe_reference_aids<T: CardTransport>(
    session: &mut CardSession<T>,
) -> Result<Vec<Vec<u8>>, TransportError> {
    let reference = session.config().reference_aids.clone();
    let mut found = Vec::new();

    for aid in reference {
        let response = session.transmit(&commands::select(&aid))?;
        match response.outcome() {
            StatusOutcome::Success => {}
            StatusOutcome::MoreData(le) => {
                session.transmit(&commands::get_response(le))?;
            }
            _ => continue,
        }

        info!(aid = %hex::encode_upper(&aid), "Reference AID selectable");
        found.push(aid);
    }

    Ok(found)
}

fn push_candidate(candidates: &mut Vec<Candidate>, aid: &[u8], source: CandidateSource) {
    if !candidates.iter().any(|c| c.aid == aid) {
        candidates.push(Candidate {
            aid: aid.to_vec(),
            source,
        });
    }
}
