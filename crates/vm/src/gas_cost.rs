use crate::errors::InternalError;

/// Gas charged for depositing `code_length` bytes of contract code.
pub fn code_deposit_cost(code_length: usize, create_data_gas: u64) -> Result<u64, InternalError> {
    let code_length: u64 = code_length
        .try_into()
        .map_err(|_| InternalError::Overflow)?;
    code_length
        .checked_mul(create_data_gas)
        .ok_or(InternalError::Overflow)
}
