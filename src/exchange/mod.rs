//! The interview server's request/response protocols: session start,
//! next-question, session end, and text-to-speech.

pub mod api;
pub mod client;
pub mod submit;

pub use api::{
    AnswerRequest, AnswerResponse, Continuation, ExchangeApi, ExchangeOutcome, StartRequest,
    StartResponse,
};
pub use client::HttpExchangeClient;
pub use submit::{assemble_request, submit_answer, AnswerSubmission};
