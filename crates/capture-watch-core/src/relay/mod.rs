mod envelope;
mod page_channel;

pub use {
    envelope::{
        PageEvent, PageStateReply, RelayEnvelope, SenderMeta, StatusRecord, TabEntry, TabId,
    },
    page_channel::{ContextId, PAGE_CHANNEL_CAPACITY, PageChannel, PageMessage, PageMessageBody},
};
