//! Shared utilities for integration testing.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use stellar_integration::blockchain::client::{
    GetEventsRequest, GetEventsResponse, HorizonApi, HorizonTransaction, RawContractEvent,
    SimulateHostFunctionResult, SimulateTransactionResponse, SorobanApi,
};
use stellar_integration::{StellarConfig, StellarError, StellarResult, StellarService};
use stellar_xdr::curr as xdr;
use stellar_xdr::curr::{Limits, ReadXdr, WriteXdr};

pub const ACCOUNT: &str = "GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAWHF";

/// Checksummed contract address built from a repeated byte.
pub fn contract_id(byte: u8) -> String {
    stellar_strkey::Contract([byte; 32]).to_string()
}

/// Config with fast retries and a roomy rate limit.
pub fn test_config() -> StellarConfig {
    let mut config = StellarConfig::default();
    config.retry.max_attempts = 3;
    config.retry.initial_delay_ms = 10;
    config.retry.max_delay_ms = 40;
    config.request_timeout_ms = 5_000;
    config
}

pub fn service(
    config: StellarConfig,
    horizon: &Arc<MockHorizon>,
    soroban: &Arc<MockSoroban>,
) -> StellarService {
    StellarService::with_clients(config, horizon.clone(), soroban.clone()).unwrap()
}

// --- ScVal builders (base64) -------------------------------------------------

fn b64(val: xdr::ScVal) -> String {
    val.to_xdr_base64(Limits::none()).unwrap()
}

fn sc_symbol(s: &str) -> xdr::ScVal {
    xdr::ScVal::Symbol(xdr::ScSymbol(s.as_bytes().to_vec().try_into().unwrap()))
}

fn sc_i128(v: i128) -> xdr::ScVal {
    xdr::ScVal::I128(xdr::Int128Parts {
        hi: (v >> 64) as i64,
        lo: v as u64,
    })
}

fn sc_address(id: &str) -> xdr::ScVal {
    if let Ok(key) = stellar_strkey::ed25519::PublicKey::from_string(id) {
        return xdr::ScVal::Address(xdr::ScAddress::Account(xdr::AccountId(
            xdr::PublicKey::PublicKeyTypeEd25519(xdr::Uint256(key.0)),
        )));
    }
    let contract = stellar_strkey::Contract::from_string(id).unwrap();
    xdr::ScVal::Address(xdr::ScAddress::Contract(xdr::Hash(contract.0)))
}

pub fn symbol_xdr(s: &str) -> String {
    b64(sc_symbol(s))
}

pub fn string_xdr(s: &str) -> String {
    b64(xdr::ScVal::String(xdr::ScString(s.as_bytes().to_vec().try_into().unwrap())))
}

pub fn u32_xdr(v: u32) -> String {
    b64(xdr::ScVal::U32(v))
}

pub fn u64_xdr(v: u64) -> String {
    b64(xdr::ScVal::U64(v))
}

pub fn bool_xdr(v: bool) -> String {
    b64(xdr::ScVal::Bool(v))
}

pub fn i128_xdr(v: i128) -> String {
    b64(sc_i128(v))
}

pub fn address_xdr(id: &str) -> String {
    b64(sc_address(id))
}

pub fn address_vec_xdr(ids: &[String]) -> String {
    let items: Vec<xdr::ScVal> = ids.iter().map(|id| sc_address(id)).collect();
    b64(xdr::ScVal::Vec(Some(xdr::ScVec(items.try_into().unwrap()))))
}

/// Symbol-keyed map; values are base64 `ScVal`s.
pub fn record_xdr(fields: &[(&str, String)]) -> String {
    let entries: Vec<xdr::ScMapEntry> = fields
        .iter()
        .map(|(key, value)| xdr::ScMapEntry {
            key: sc_symbol(key),
            val: xdr::ScVal::from_xdr_base64(value, Limits::none()).unwrap(),
        })
        .collect();
    b64(xdr::ScVal::Map(Some(xdr::ScMap(entries.try_into().unwrap()))))
}

pub fn void_xdr() -> String {
    b64(xdr::ScVal::Void)
}

// --- Mock RPC surfaces -------------------------------------------------------

/// Horizon stand-in. Transaction lookups follow a script whose last entry repeats.
pub struct MockHorizon {
    transactions: Mutex<VecDeque<StellarResult<HorizonTransaction>>>,
    sequence: StellarResult<i64>,
    pub account_calls: AtomicU32,
    pub transaction_calls: AtomicU32,
}

impl MockHorizon {
    pub fn new() -> Arc<Self> {
        Self::with_transactions(vec![Err(StellarError::NotFound("transaction".into()))])
    }

    pub fn with_transactions(script: Vec<StellarResult<HorizonTransaction>>) -> Arc<Self> {
        Arc::new(Self {
            transactions: Mutex::new(script.into()),
            // placeholder accounts do not exist on chain
            sequence: Err(StellarError::NotFound("account".into())),
            account_calls: AtomicU32::new(0),
            transaction_calls: AtomicU32::new(0),
        })
    }

    pub fn calls(&self) -> u32 {
        self.account_calls.load(Ordering::SeqCst) + self.transaction_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HorizonApi for MockHorizon {
    async fn account_sequence(&self, _account_id: &str) -> StellarResult<i64> {
        self.account_calls.fetch_add(1, Ordering::SeqCst);
        self.sequence.clone()
    }

    async fn transaction(&self, _hash: &str) -> StellarResult<HorizonTransaction> {
        self.transaction_calls.fetch_add(1, Ordering::SeqCst);
        let mut script = self.transactions.lock().unwrap();
        if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script.front().cloned().unwrap()
        }
    }
}

pub fn horizon_tx(hash: &str, successful: bool) -> HorizonTransaction {
    HorizonTransaction {
        hash: hash.to_string(),
        ledger: 1234,
        created_at: "2024-06-01T08:00:00Z".to_string(),
        source_account: ACCOUNT.to_string(),
        fee_charged: "100".to_string(),
        successful,
        memo: Some("launch".to_string()),
        operation_count: 1,
        envelope_xdr: "AAAAAgAAAAA=".to_string(),
        result_xdr: "AAAAAAAAAGT/////AAAAAQ==".to_string(),
        result_meta_xdr: "AAAAAwAAAAA=".to_string(),
    }
}

/// What a simulated method answers.
#[derive(Clone)]
pub enum Simulated {
    Returns(String),
    HostError(String),
    Transport(StellarError),
}

/// Soroban RPC stand-in. Simulations are answered per invoked method name.
pub struct MockSoroban {
    methods: Mutex<HashMap<String, Simulated>>,
    event_pages: Mutex<VecDeque<StellarResult<GetEventsResponse>>>,
    pub simulations: Mutex<Vec<(String, Vec<xdr::ScVal>)>>,
    pub event_requests: Mutex<Vec<GetEventsRequest>>,
}

impl MockSoroban {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            methods: Mutex::new(HashMap::new()),
            event_pages: Mutex::new(VecDeque::new()),
            simulations: Mutex::new(Vec::new()),
            event_requests: Mutex::new(Vec::new()),
        })
    }

    pub fn on(&self, method: &str, answer: Simulated) {
        self.methods.lock().unwrap().insert(method.to_string(), answer);
    }

    pub fn returns(&self, method: &str, xdr: String) {
        self.on(method, Simulated::Returns(xdr));
    }

    pub fn push_events(&self, page: StellarResult<GetEventsResponse>) {
        self.event_pages.lock().unwrap().push_back(page);
    }

    pub fn simulation_count(&self) -> usize {
        self.simulations.lock().unwrap().len()
    }

    pub fn simulations_of(&self, method: &str) -> usize {
        self.simulations
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == method)
            .count()
    }

    pub fn calls(&self) -> usize {
        self.simulation_count() + self.event_requests.lock().unwrap().len()
    }
}

/// Invoked method name and arguments of a simulation envelope.
fn invocation(envelope_xdr: &str) -> (String, Vec<xdr::ScVal>) {
    let envelope = xdr::TransactionEnvelope::from_xdr_base64(envelope_xdr, Limits::none()).unwrap();
    let xdr::TransactionEnvelope::Tx(v1) = envelope else {
        panic!("expected v1 envelope");
    };
    let xdr::OperationBody::InvokeHostFunction(op) = &v1.tx.operations[0].body else {
        panic!("expected host function invocation");
    };
    let xdr::HostFunction::InvokeContract(call) = &op.host_function else {
        panic!("expected contract invocation");
    };
    (
        String::from_utf8(call.function_name.0.as_slice().to_vec()).unwrap(),
        call.args.to_vec(),
    )
}

#[async_trait]
impl SorobanApi for MockSoroban {
    async fn simulate_transaction(
        &self,
        envelope_xdr: &str,
    ) -> StellarResult<SimulateTransactionResponse> {
        let (method, args) = invocation(envelope_xdr);
        self.simulations.lock().unwrap().push((method.clone(), args));

        let answer = self.methods.lock().unwrap().get(&method).cloned();
        match answer {
            Some(Simulated::Returns(xdr)) => Ok(SimulateTransactionResponse {
                error: None,
                results: vec![SimulateHostFunctionResult { xdr, auth: Vec::new() }],
                latest_ledger: 500,
            }),
            Some(Simulated::HostError(error)) => Ok(SimulateTransactionResponse {
                error: Some(error),
                results: Vec::new(),
                latest_ledger: 500,
            }),
            Some(Simulated::Transport(e)) => Err(e),
            None => Ok(SimulateTransactionResponse {
                error: Some(format!("HostError: no function '{}'", method)),
                results: Vec::new(),
                latest_ledger: 500,
            }),
        }
    }

    async fn get_events(&self, request: &GetEventsRequest) -> StellarResult<GetEventsResponse> {
        self.event_requests.lock().unwrap().push(request.clone());
        self.event_pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(GetEventsResponse::default()))
    }
}

pub fn burn_event(contract: &str, from: &str, amount: i128, ledger: u32) -> RawContractEvent {
    RawContractEvent {
        event_type: "contract".to_string(),
        ledger,
        ledger_closed_at: "2024-06-01T08:00:05Z".to_string(),
        contract_id: contract.to_string(),
        id: format!("{:019}-0000000001", ledger),
        topic: vec![symbol_xdr("burn"), address_xdr(from)],
        value: i128_xdr(amount),
        in_successful_contract_call: true,
        tx_hash: format!("tx{}", ledger),
    }
}

// --- Raw HTTP backend --------------------------------------------------------

/// One request as seen by the programmable backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

/// Start a programmable HTTP backend on an ephemeral port.
///
/// Each connection carries one request; `f` decides status and JSON body.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(RecordedRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_request(&mut socket).await else {
                            return;
                        };
                        let (status, body) = f(request).await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            429 => "429 Too Many Requests",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> Option<RecordedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let mut request_line = head.lines().next()?.split_whitespace();
    Some(RecordedRequest {
        method: request_line.next()?.to_string(),
        path: request_line.next()?.to_string(),
        body: String::from_utf8_lossy(&buf[header_end..]).into_owned(),
    })
}
