pub mod mock_sender;
