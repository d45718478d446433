//! Application layer orchestrating the gateway adapters.
//!
//! `OzowCheckout` and `build_paypage_request` produce signed redirect forms,
//! `PayGateInitiator` drives the PayWeb3 initiate protocol over an injected transport,
//! and `NotifyDispatcher` turns processor callbacks into order updates.

pub mod checkout;
pub mod initiate;
pub mod notify;
pub mod paypage;
