use crate::{Error, FlakeId, Result};

/// What a generator does once all 4096 sequence values of the current
/// millisecond have been issued.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ExhaustionPolicy {
    /// Report [`IdGenStatus::Pending`] so the caller waits for the next tick.
    ///
    /// [`IdGenStatus::Pending`]: crate::IdGenStatus::Pending
    #[default]
    Wait,
    /// Fail the request with [`Error::DiscriminatorExhausted`].
    Fail,
}

/// Validates that `machine_id` fits in the 10-bit machine ID field.
///
/// # Errors
///
/// Returns [`Error::MachineIdOutOfRange`] otherwise.
pub fn validate_machine_id(machine_id: u64) -> Result<u64> {
    let max = FlakeId::max_machine_id();
    if machine_id > max {
        return Err(Error::MachineIdOutOfRange { machine_id, max });
    }
    Ok(machine_id)
}

/// Validates a set of machine IDs for a [`MultiFlakeGenerator`].
///
/// # Errors
///
/// - [`Error::NoMachineIds`] if `machine_ids` is empty
/// - [`Error::MachineIdOutOfRange`] if any ID exceeds 10 bits
/// - [`Error::DuplicateMachineId`] if an ID is listed twice
///
/// [`MultiFlakeGenerator`]: crate::MultiFlakeGenerator
pub fn validate_machine_ids(machine_ids: &[u64]) -> Result<()> {
    if machine_ids.is_empty() {
        return Err(Error::NoMachineIds);
    }
    for (i, &machine_id) in machine_ids.iter().enumerate() {
        validate_machine_id(machine_id)?;
        if machine_ids[..i].contains(&machine_id) {
            return Err(Error::DuplicateMachineId { machine_id });
        }
    }
    Ok(())
}

/// Rejects timestamps that no longer fit in the 42-bit field.
#[inline]
pub(crate) fn check_timestamp(now: u64) -> Result<u64> {
    let max = FlakeId::max_timestamp();
    if now > max {
        return Err(Error::TimestampOverflow {
            timestamp: now,
            max,
        });
    }
    Ok(now)
}
