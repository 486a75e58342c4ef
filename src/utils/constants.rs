//! Constants shared across the RPC and transaction layers.

/// Block tag used for read-only calls and batch elements
pub const LATEST_BLOCK_TAG: &str = "latest";

/// Block tag used when fetching the next usable nonce
pub const PENDING_BLOCK_TAG: &str = "pending";

/// Default attempt budget for retried RPC operations
pub const DEFAULT_MAX_RETRIES: u32 = 8;

/// Default delay before the second attempt of a retried operation
pub const DEFAULT_INITIAL_RETRY_DELAY_MS: u64 = 1_000;

/// Default upper bound for the delay between two attempts
pub const DEFAULT_MAX_RETRY_DELAY_MS: u64 = 8_000;

/// Default client-side timeout of a single RPC round trip
pub const DEFAULT_RPC_TIMEOUT_MS: u64 = 10_000;

/// JSON-RPC payload used to probe an endpoint during lazy health checks
pub const HEALTH_CHECK_PAYLOAD: &str = r#"{"id":1,"jsonrpc":"2.0","method":"eth_chainId","params":[]}"#;

/// HTTP status codes that demote the active endpoint and trigger rotation
/// - 429: Too Many Requests
/// - 502, 503, 504: gateway class failures of hosted providers
pub const ROTATE_ON_ERROR_CODES: [u16; 4] = [429, 502, 503, 504];

/// Substrings identifying gateway class provider failures during gas estimation
pub const GATEWAY_ERROR_PATTERNS: [&str; 5] = [
	"502 bad gateway",
	"503 service unavailable",
	"504 gateway timeout",
	"gateway timeout",
	"bad gateway",
];

/// Substrings a node returns when a raw transaction is already in its pool
pub const ALREADY_KNOWN_PATTERNS: [&str; 2] = ["already known", "known transaction"];

/// Wei in one gwei, used for the configured gas price floor
pub const WEI_PER_GWEI: u64 = 1_000_000_000;

/// Gas consumed by a plain value transfer without call data
pub const TRANSFER_GAS_LIMIT: u64 = 21_000;

/// Contract method whose gas cost scales with the number of assigned values
pub const REVEAL_METHOD: &str = "reveal";

/// View method returning the number of values each staker has to reveal
pub const TO_ASSIGN_METHOD: &str = "toAssign";

/// Default extra gas per assigned value folded into a reveal estimate
pub const DEFAULT_REVEAL_GAS_PER_ASSIGNMENT: u64 = 10_000;
