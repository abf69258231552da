use std::collections::HashMap;

use crate::types::{NullPolicy, ParamKey, ParamType, ParamValue};

/// A connection-level default binding, applied to every prepared statement
/// whose expected parameters include its name.
#[derive(Debug, Clone)]
pub struct RegisteredValue {
    pub value: ParamValue,
    pub ty: ParamType,
    pub policy: NullPolicy,
}

pub(crate) type ParamRegistry = HashMap<ParamKey, RegisteredValue>;
