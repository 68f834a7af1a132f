#![cfg_attr(not(feature = "std"), no_std, no_main)]

/// Decimals the development-chain feed reports.
pub const MOCK_DECIMALS: u8 = 18;

/// 2000 reference units per native unit at [`MOCK_DECIMALS`].
pub const MOCK_INITIAL_PRICE: i128 = 2_000_000_000_000_000_000_000;

pub use self::mock_price_feed::MockPriceFeedRef;

/// Fixed-answer price feed for local and test deployments.
///
/// Answers only change when someone calls `update_answer` or
/// `update_round_data`. Message names match the aggregator interface the
/// ledger dispatches to by selector.
#[ink::contract]
pub mod mock_price_feed {
    use ink::prelude::string::String;
    use ink::storage::Mapping;

    /// `(round_id, answer, started_at, updated_at, answered_in_round)`
    pub type RoundData = (u128, i128, u64, u64, u128);

    pub const VERSION: u32 = 0;

    #[ink(storage)]
    pub struct MockPriceFeed {
        decimals: u8,
        latest_answer: i128,
        latest_timestamp: u64,
        latest_round: u128,
        answers: Mapping<u128, i128>,
        timestamps: Mapping<u128, u64>,
        started_at: Mapping<u128, u64>,
    }

    #[ink(event)]
    pub struct AnswerUpdated {
        #[ink(topic)]
        current: i128,
        #[ink(topic)]
        round_id: u128,
        updated_at: u64,
    }

    #[ink(event)]
    pub struct NewRound {
        #[ink(topic)]
        round_id: u128,
        #[ink(topic)]
        started_by: AccountId,
        started_at: u64,
    }

    #[derive(Debug, PartialEq, Eq, scale::Encode, scale::Decode)]
    #[cfg_attr(feature = "std", derive(scale_info::TypeInfo))]
    pub enum Error {
        RoundNotFound,
    }

    impl MockPriceFeed {
        #[ink(constructor)]
        pub fn new(decimals: u8, initial_answer: i128) -> Self {
            let mut feed = Self {
                decimals,
                latest_answer: 0,
                latest_timestamp: 0,
                latest_round: 0,
                answers: Mapping::default(),
                timestamps: Mapping::default(),
                started_at: Mapping::default(),
            };
            feed.update_answer(initial_answer);
            feed
        }

        /// Opens the next round with `answer`, stamped with the current block time.
        #[ink(message)]
        pub fn update_answer(&mut self, answer: i128) {
            let now = self.env().block_timestamp();
            let round_id = self.latest_round.saturating_add(1);
            self.record_round(round_id, answer, now, now);

            self.env().emit_event(NewRound {
                round_id,
                started_by: self.env().caller(),
                started_at: now,
            });
            self.env().emit_event(AnswerUpdated {
                current: answer,
                round_id,
                updated_at: now,
            });
        }

        #[ink(message)]
        pub fn update_round_data(
            &mut self,
            round_id: u128,
            answer: i128,
            timestamp: u64,
            started_at: u64,
        ) {
            self.record_round(round_id, answer, timestamp, started_at);
            self.env().emit_event(AnswerUpdated {
                current: answer,
                round_id,
                updated_at: timestamp,
            });
        }

        fn record_round(&mut self, round_id: u128, answer: i128, timestamp: u64, started_at: u64) {
            self.latest_round = round_id;
            self.latest_answer = answer;
            self.latest_timestamp = timestamp;
            self.answers.insert(round_id, &answer);
            self.timestamps.insert(round_id, &timestamp);
            self.started_at.insert(round_id, &started_at);
        }

        #[ink(message)]
        pub fn decimals(&self) -> u8 {
            self.decimals
        }

        #[ink(message)]
        pub fn description(&self) -> String {
            String::from("mock price feed")
        }

        #[ink(message)]
        pub fn version(&self) -> u32 {
            VERSION
        }

        #[ink(message)]
        pub fn latest_answer(&self) -> i128 {
            self.latest_answer
        }

        #[ink(message)]
        pub fn latest_round(&self) -> u128 {
            self.latest_round
        }

        #[ink(message)]
        pub fn latest_timestamp(&self) -> u64 {
            self.latest_timestamp
        }

        #[ink(message)]
        pub fn latest_round_data(&self) -> RoundData {
            let round_id = self.latest_round;
            (
                round_id,
                self.latest_answer,
                self.started_at.get(round_id).unwrap_or_default(),
                self.latest_timestamp,
                round_id,
            )
        }

        #[ink(message)]
        pub fn get_round_data(&self, round_id: u128) -> Result<RoundData, Error> {
            let answer = self.answers.get(round_id).ok_or(Error::RoundNotFound)?;
            Ok((
                round_id,
                answer,
                self.started_at.get(round_id).unwrap_or_default(),
                self.timestamps.get(round_id).unwrap_or_default(),
                round_id,
            ))
        }
    }

}
