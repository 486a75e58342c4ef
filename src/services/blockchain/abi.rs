//! ABI helpers shared by the invoker and the batch caller.

use alloy::{
	dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt},
	json_abi::{Function, JsonAbi},
	primitives::Bytes,
};

use crate::services::blockchain::BlockChainError;

/// Looks up `method` in `abi`
///
/// For overloaded methods the first overload taking `arity` arguments wins; without an
/// arity the first overload is used.
pub fn find_function<'a>(
	abi: &'a JsonAbi,
	method: &str,
	arity: Option<usize>,
) -> Result<&'a Function, BlockChainError> {
	let overloads = abi
		.function(method)
		.filter(|overloads| !overloads.is_empty())
		.ok_or_else(|| BlockChainError::MethodNotFound(method.to_string()))?;

	let function = match arity {
		Some(arity) => overloads
			.iter()
			.find(|function| function.inputs.len() == arity)
			.unwrap_or(&overloads[0]),
		None => &overloads[0],
	};
	Ok(function)
}

/// ABI-encodes a call of `method`, selector included
pub fn encode_call(
	abi: &JsonAbi,
	method: &str,
	args: &[DynSolValue],
) -> Result<Bytes, BlockChainError> {
	encode_function_call(find_function(abi, method, Some(args.len()))?, args)
}

/// ABI-encodes a call of a resolved `function`
pub fn encode_function_call(
	function: &Function,
	args: &[DynSolValue],
) -> Result<Bytes, BlockChainError> {
	function
		.abi_encode_input(args)
		.map(Bytes::from)
		.map_err(|e| BlockChainError::EncodingError(format!("{}: {}", function.name, e)))
}

/// Decodes the return data of `method` into its ordered output values
pub fn decode_output(
	abi: &JsonAbi,
	method: &str,
	data: &[u8],
) -> Result<Vec<DynSolValue>, BlockChainError> {
	decode_function_output(find_function(abi, method, None)?, data)
}

/// Decodes the return data of a resolved `function`
pub fn decode_function_output(
	function: &Function,
	data: &[u8],
) -> Result<Vec<DynSolValue>, BlockChainError> {
	function
		.abi_decode_output(data)
		.map_err(|e| BlockChainError::DecodeError(format!("{}: {}", function.name, e)))
}
