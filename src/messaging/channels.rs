// Communication channels lock-free

use crate::messaging::command::AudioCommand;
use ringbuf::{HeapRb, traits::Split};

/// Default queue depth; a 0.1s lookahead commits only a handful of strums
pub const DEFAULT_COMMAND_CAPACITY: usize = 256;

pub type CommandProducer = ringbuf::HeapProd<AudioCommand>;
pub type CommandConsumer = ringbuf::HeapCons<AudioCommand>;

pub fn create_command_channel(capacity: usize) -> (CommandProducer, CommandConsumer) {
    let rb = HeapRb::<AudioCommand>::new(capacity.max(1));
    rb.split()
}
