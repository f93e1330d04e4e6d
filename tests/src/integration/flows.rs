//! # Integration Test Flows
//!
//! End-to-end compact-block choreography across `compact-relay`, `txpool`,
//! and the wire format: announce, fill from pool, fetch missing, finalize,
//! hand off. Includes the shared-ownership accounting checks (pool hold vs.
//! engine hold) that only make sense against the real pool.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use compact_relay::{
        BlockTxnRequest, BlockTxnResponse, CompactBlock, CompactRelayService, FillStatus,
        PartialBlock, PrefilledTransaction, RelayError, ValidatorGateway,
    };
    use shared_types::{Block, BlockHeader, Hash, Transaction, TxInput, TxOutput};
    use txpool::TransactionPool;

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    fn rand_hash() -> Hash {
        rand::random()
    }

    /// Three-transaction block: generation tx, a one-input spend, and a
    /// ten-input spend. Merkle root committed in the header.
    fn build_block_test_case() -> Block {
        let coinbase = Transaction {
            version: 1,
            inputs: vec![TxInput {
                prev_hash: [0u8; 32],
                prev_index: u32::MAX,
                script_sig: vec![0u8; 10],
            }],
            outputs: vec![TxOutput {
                value: 42,
                script_pubkey: vec![],
            }],
            lock_time: 0,
        };

        let tx1 = Transaction {
            version: 1,
            inputs: vec![TxInput {
                prev_hash: rand_hash(),
                prev_index: 0,
                script_sig: vec![0u8; 10],
            }],
            outputs: vec![TxOutput {
                value: 42,
                script_pubkey: vec![],
            }],
            lock_time: 0,
        };

        let tx2 = Transaction {
            version: 1,
            inputs: (0..10)
                .map(|_| TxInput {
                    prev_hash: rand_hash(),
                    prev_index: 0,
                    script_sig: vec![0u8; 10],
                })
                .collect(),
            outputs: vec![TxOutput {
                value: 42,
                script_pubkey: vec![],
            }],
            lock_time: 0,
        };

        let mut block = Block {
            header: BlockHeader {
                version: 1,
                parent_hash: rand_hash(),
                merkle_root: [0u8; 32],
                timestamp: 1_701_705_600,
                bits: 0x1E0F_FFF0,
                nonce: 0,
            },
            transactions: vec![coinbase, tx1, tx2],
        };
        block.header.merkle_root = block.computed_merkle_root();
        block
    }

    #[derive(Default)]
    struct CollectingValidator {
        submitted: Mutex<Vec<Block>>,
    }

    impl ValidatorGateway for CollectingValidator {
        fn submit_block(&self, block: Block) -> Result<(), RelayError> {
            self.submitted.lock().push(block);
            Ok(())
        }
    }

    // =========================================================================
    // RECONSTRUCTION FLOWS
    // =========================================================================

    #[test]
    fn test_simple_round_trip() {
        let block = build_block_test_case();
        let pool = TransactionPool::new();
        // Pool the third transaction only; handle + pool entry = 2 holds.
        let handle = pool.insert_tx(block.transactions[2].clone()).unwrap();
        assert_eq!(Arc::strong_count(&handle), 2);

        let msg = CompactBlock::from_block_with_nonce(&block, 0xC0FF_EE00).unwrap();
        let bytes = msg.serialize();
        let parsed = CompactBlock::parse(&bytes).unwrap();
        assert_eq!(parsed, msg);
        assert_eq!(parsed.serialize(), bytes);

        let mut partial = PartialBlock::new();
        let status = partial.init_data(&parsed, &pool).unwrap();
        assert_eq!(status, FillStatus::Incomplete { missing: vec![1] });
        assert!(partial.is_tx_available(0));
        assert!(!partial.is_tx_available(1));
        assert!(partial.is_tx_available(2));

        // Matching into the slot took exactly one extra hold.
        assert_eq!(Arc::strong_count(&handle), 3);

        // Pool churn: evict the matched transaction. The engine's slot
        // survives on its own hold.
        drop(pool.remove(&handle.hash()));
        assert_eq!(Arc::strong_count(&handle), 2);
        assert!(partial.is_tx_available(2));

        // No transactions supplied for the missing slot: structural error,
        // engine stays usable.
        assert_eq!(
            partial.try_finalize(vec![]),
            Err(RelayError::MissingCountMismatch {
                expected: 1,
                supplied: 0
            })
        );

        // Wrong transaction: reconstruction succeeds structurally, only the
        // Merkle root betrays it one layer up.
        let mutated = partial
            .try_finalize(vec![block.transactions[2].clone()])
            .unwrap();
        assert_ne!(mutated.computed_merkle_root(), block.header.merkle_root);

        // Finalizing released the engine hold; with the pool entry evicted
        // above, only the test handle remains.
        assert_eq!(Arc::strong_count(&handle), 1);

        // Fresh engine, correct transaction: exact block back.
        pool.insert(Arc::clone(&handle)).unwrap();
        let mut partial = PartialBlock::new();
        partial.init_data(&parsed, &pool).unwrap();
        let rebuilt = partial
            .try_finalize(vec![block.transactions[1].clone()])
            .unwrap();
        assert_eq!(rebuilt, block);
        assert_eq!(rebuilt.hash(), block.hash());
        assert_eq!(rebuilt.computed_merkle_root(), block.header.merkle_root);
    }

    #[test]
    fn test_non_coinbase_preforward_round_trip() {
        let block = build_block_test_case();
        let pool = TransactionPool::new();
        let handle = pool.insert_tx(block.transactions[2].clone()).unwrap();
        assert_eq!(Arc::strong_count(&handle), 2);

        // Custom message: prefill tx 1 but not the generation transaction.
        let mut msg = CompactBlock {
            header: block.header.clone(),
            nonce: 12345,
            prefilled: vec![PrefilledTransaction {
                index: 1,
                tx: block.transactions[1].clone(),
            }],
            short_ids: vec![],
        };
        msg.short_ids = vec![
            msg.get_short_id(&block.transactions[0].hash()),
            msg.get_short_id(&block.transactions[2].hash()),
        ];

        let parsed = CompactBlock::parse(&msg.serialize()).unwrap();
        assert_eq!(parsed, msg);

        let mut partial = PartialBlock::new();
        let status = partial.init_data(&parsed, &pool).unwrap();
        // The unprefilled generation transaction is just a missing slot,
        // not a rejection.
        assert_eq!(status, FillStatus::Incomplete { missing: vec![0] });
        assert!(!partial.is_tx_available(0));
        assert!(partial.is_tx_available(1));
        assert!(partial.is_tx_available(2));
        assert_eq!(Arc::strong_count(&handle), 3);

        // Wrong transaction for slot 0: structurally fine, Merkle mismatch.
        let mutated = partial
            .try_finalize(vec![block.transactions[1].clone()])
            .unwrap();
        assert_ne!(mutated.computed_merkle_root(), block.header.merkle_root);
        assert_eq!(Arc::strong_count(&handle), 2);

        let mut partial = PartialBlock::new();
        partial.init_data(&parsed, &pool).unwrap();
        let rebuilt = partial
            .try_finalize(vec![block.transactions[0].clone()])
            .unwrap();
        assert_eq!(rebuilt, block);
        assert_eq!(rebuilt.computed_merkle_root(), block.header.merkle_root);
        assert_eq!(Arc::strong_count(&handle), 2);
    }

    #[test]
    fn test_sufficient_preforward_round_trip() {
        let block = build_block_test_case();
        let pool = TransactionPool::new();
        let handle = pool.insert_tx(block.transactions[1].clone()).unwrap();
        assert_eq!(Arc::strong_count(&handle), 2);

        // Prefill generation tx and tx 2; only tx 1 rides as a short id.
        let mut msg = CompactBlock {
            header: block.header.clone(),
            nonce: 98765,
            prefilled: vec![
                PrefilledTransaction {
                    index: 0,
                    tx: block.transactions[0].clone(),
                },
                PrefilledTransaction {
                    index: 2,
                    tx: block.transactions[2].clone(),
                },
            ],
            short_ids: vec![],
        };
        msg.short_ids = vec![msg.get_short_id(&block.transactions[1].hash())];

        let parsed = CompactBlock::parse(&msg.serialize()).unwrap();
        assert_eq!(parsed, msg);

        let mut partial = PartialBlock::new();
        let status = partial.init_data(&parsed, &pool).unwrap();
        assert_eq!(status, FillStatus::Complete);
        assert_eq!(Arc::strong_count(&handle), 3);

        let rebuilt = partial.try_finalize(vec![]).unwrap();
        assert_eq!(rebuilt, block);
        assert_eq!(rebuilt.computed_merkle_root(), block.header.merkle_root);
        assert_eq!(Arc::strong_count(&handle), 2);
    }

    #[test]
    fn test_generation_only_block_round_trip() {
        let mut block = build_block_test_case();
        block.transactions.truncate(1);
        block.header.merkle_root = block.computed_merkle_root();

        let pool = TransactionPool::new();
        let msg = CompactBlock::from_block_with_nonce(&block, 55).unwrap();
        assert!(msg.short_ids.is_empty());
        assert_eq!(msg.prefilled.len(), 1);

        let parsed = CompactBlock::parse(&msg.serialize()).unwrap();
        let mut partial = PartialBlock::new();
        assert_eq!(
            partial.init_data(&parsed, &pool).unwrap(),
            FillStatus::Complete
        );

        let rebuilt = partial.try_finalize(vec![]).unwrap();
        assert_eq!(rebuilt, block);
        assert_eq!(rebuilt.computed_merkle_root(), block.header.merkle_root);
    }

    // =========================================================================
    // WIRE FORMAT
    // =========================================================================

    #[test]
    fn test_transactions_request_serialization() {
        let req = BlockTxnRequest::new(rand_hash(), vec![0, 1, 3, 4]);
        let bytes = req.serialize();

        // Block hash, count, then deltas against previous-plus-one.
        assert_eq!(&bytes[..32], &req.block_hash);
        assert_eq!(&bytes[32..], &[4, 0, 0, 1, 0]);

        let parsed = BlockTxnRequest::parse(&bytes).unwrap();
        assert_eq!(parsed, req);
        assert_eq!(parsed.serialize(), bytes);
    }

    // =========================================================================
    // SERVICE CHOREOGRAPHY
    // =========================================================================

    #[test]
    fn test_service_round_trip_with_missing_transactions() {
        let block = build_block_test_case();

        // Receiver knows tx 1 but not tx 2.
        let pool = Arc::new(TransactionPool::new());
        let handle = pool.insert_tx(block.transactions[1].clone()).unwrap();
        let validator = Arc::new(CollectingValidator::default());
        let service = CompactRelayService::new(Arc::clone(&pool), Arc::clone(&validator));

        // Sender announces; the message crosses the wire.
        let announced = CompactBlock::from_block(&block).unwrap();
        let msg = CompactBlock::parse(&announced.serialize()).unwrap();

        let request = service.handle_compact_block(&msg).unwrap().unwrap();
        assert_eq!(request.indexes, vec![2]);
        assert_eq!(service.in_flight_count(), 1);

        // The pool evicts tx 1 while the request is in flight; the parked
        // engine keeps its own hold.
        drop(pool.remove(&handle.hash()));

        // Sender answers; the response crosses the wire.
        let response = service.respond_tx_request(&block, &request).unwrap();
        let response = BlockTxnResponse::parse(&response.serialize()).unwrap();
        service.handle_tx_response(response).unwrap();

        assert_eq!(service.in_flight_count(), 0);
        let submitted = validator.submitted.lock();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0], block);
        assert_eq!(
            submitted[0].computed_merkle_root(),
            submitted[0].header.merkle_root
        );
        // All engine holds are gone: only our test handle remains.
        assert_eq!(Arc::strong_count(&handle), 1);
    }

    #[test]
    fn test_service_completes_without_round_trip_when_pool_is_full() {
        let block = build_block_test_case();

        let pool = Arc::new(TransactionPool::new());
        for tx in &block.transactions[1..] {
            pool.insert_tx(tx.clone()).unwrap();
        }
        let validator = Arc::new(CollectingValidator::default());
        let service = CompactRelayService::new(Arc::clone(&pool), Arc::clone(&validator));

        let msg = service.encode_block(&block).unwrap();
        let msg = CompactBlock::parse(&msg.serialize()).unwrap();
        assert!(service.handle_compact_block(&msg).unwrap().is_none());

        let submitted = validator.submitted.lock();
        assert_eq!(submitted.as_slice(), &[block]);
    }
}
