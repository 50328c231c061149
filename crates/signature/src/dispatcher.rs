//! Seam towards the interface device layer
//!
//! The sequencer never talks to a reader directly. It hands command bytes
//! and API calls to a [`Dispatcher`], addressed by slot handle.

use std::fmt;

use bytes::Bytes;
use ecard_apdu_core::{CardTransport, TransportError};

use crate::legacy::{ApiCall, ApiResponse};

/// Routes card commands and API calls to the right reader slot
pub trait Dispatcher: fmt::Debug {
    /// Send a command APDU to the card in `slot_handle` and return `data || SW1 SW2`
    fn transmit(&mut self, command: &[u8], slot_handle: &[u8]) -> Result<Bytes, TransportError>;

    /// Deliver an API call
    fn deliver(&mut self, call: ApiCall) -> Result<ApiResponse, TransportError>;
}

impl<D: Dispatcher + ?Sized> Dispatcher for &mut D {
    fn transmit(&mut self, command: &[u8], slot_handle: &[u8]) -> Result<Bytes, TransportError> {
        (**self).transmit(command, slot_handle)
    }

    fn deliver(&mut self, call: ApiCall) -> Result<ApiResponse, TransportError> {
        (**self).deliver(call)
    }
}

/// A [`Dispatcher`] bound to one slot, usable as a [`CardTransport`]
#[derive(Debug)]
pub struct SlotTransport<'a, D: Dispatcher + ?Sized> {
    dispatcher: &'a mut D,
    slot_handle: &'a [u8],
}

impl<'a, D: Dispatcher + ?Sized> SlotTransport<'a, D> {
    /// Bind `dispatcher` to `slot_handle`
    pub const fn new(dispatcher: &'a mut D, slot_handle: &'a [u8]) -> Self {
        Self {
            dispatcher,
            slot_handle,
        }
    }

    /// The bound slot handle
    pub const fn slot_handle(&self) -> &[u8] {
        self.slot_handle
    }

    /// The underlying dispatcher, for calls that are not card commands
    pub fn dispatcher_mut(&mut self) -> &mut D {
        &mut *self.dispatcher
    }
}

impl<D: Dispatcher + ?Sized> CardTransport for SlotTransport<'_, D> {
    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        self.dispatcher.transmit(command, self.slot_handle)
    }

    fn is_connected(&self) -> bool {
        true
    }

    fn reset(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::collections::VecDeque;

    use ecard_apdu_core::MockTransport;

    use super::*;

    /// Scripted dispatcher recording everything it is asked to do
    #[derive(Debug, Default)]
    pub(crate) struct MockDispatcher {
        pub(crate) card: MockTransport,
        pub(crate) slot_handles: Vec<Vec<u8>>,
        pub(crate) calls: Vec<ApiCall>,
        pub(crate) api_responses: VecDeque<ApiResponse>,
    }

    impl MockDispatcher {
        pub(crate) fn scripted(responses: &[&[u8]]) -> Self {
            Self {
                card: MockTransport::scripted(responses),
                ..Default::default()
            }
        }

        pub(crate) fn commands(&self) -> Vec<&[u8]> {
            self.card.commands.iter().map(|c| c.as_ref()).collect()
        }
    }

    impl Dispatcher for MockDispatcher {
        fn transmit(&mut self, command: &[u8], slot_handle: &[u8]) -> Result<Bytes, TransportError> {
            self.slot_handles.push(slot_handle.to_vec());
            self.card.transmit_raw(command)
        }

        fn deliver(&mut self, call: ApiCall) -> Result<ApiResponse, TransportError> {
            self.calls.push(call);
            Ok(self.api_responses.pop_front().unwrap_or_default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockDispatcher;
    use super::*;
    use ecard_apdu_core::{CardExecutor, Command};
    use hex_literal::hex;

    #[test]
    fn test_slot_transport_addresses_slot() {
        let mut dispatcher = MockDispatcher::scripted(&[&hex!("0102 9000")]);
        let slot = hex!("AA55");

        {
            let mut executor = CardExecutor::new(SlotTransport::new(&mut dispatcher, &slot));
            let data = executor
                .transmit_checked(&Command::new_with_le(0x00, 0xB0, 0x00, 0x00, 0x02))
                .unwrap();
            assert_eq!(data.as_ref(), &hex!("0102"));
        }

        assert_eq!(dispatcher.slot_handles, vec![slot.to_vec()]);
        assert_eq!(dispatcher.commands(), vec![&hex!("00B0000002")[..]]);
    }
}
