//! LOG0-LOG4

use crate::error::EvmResult;
use crate::host::Host;
use crate::interpreter::{Control, RunState};
use crate::result::Log;
use bytes::Bytes;
use cadenza_primitives::H256;

pub(super) fn log(state: &mut RunState<'_>, _host: &mut dyn Host) -> EvmResult<Control> {
    let [offset, size] = state.stack.pop_n()?;
    let topic_count = state.opcode.log_topics();
    let mut topics = Vec::with_capacity(topic_count);
    for _ in 0..topic_count {
        topics.push(H256::from_word(state.stack.pop()?));
    }
    let data = match state.touch_memory(offset, size)? {
        Some((offset, size)) => Bytes::from(state.memory.read(offset, size)),
        None => Bytes::new(),
    };
    state.logs.push(Log {
        address: state.address,
        topics,
        data,
    });
    Ok(Control::Continue)
}
