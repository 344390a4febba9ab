//! Server call summary
//!
//! After a stream reset the server restarts the conversation with an error
//! report: a message byte of 4 followed by the call summary. The summary
//! carries the return code, cursor bookkeeping and, when the return code is
//! non-zero, the error message text in the session character set.

use crate::error::Result;
use crate::session::Session;

/// One server call summary
#[derive(Debug, Clone, Default)]
pub struct Summary {
    /// End-of-call status word
    pub end_of_call_status: i32,
    /// End-to-end tracing sequence number
    pub end_to_end_seq: i32,
    /// Current row number
    pub cur_row_number: i32,
    /// Oracle return code; non-zero means the call failed
    pub ret_code: u32,
    /// Index of the array element that errored
    pub array_elem_with_error: i32,
    /// Error number for that array element
    pub array_elem_errno: i32,
    /// Cursor id the summary refers to
    pub cursor_id: i32,
    /// Position of the error in the statement text
    pub error_pos: i32,
    /// SQL statement type
    pub sql_type: u8,
    /// Fatal-error flag
    pub fatal: u8,
    /// Summary flags word
    pub flags: i32,
    /// User cursor options
    pub user_cursor_opt: i32,
    /// UPI parameter
    pub upi_param: u8,
    /// Warning flag
    pub warning_flag: u8,
    /// Redo byte address
    pub rba: i32,
    /// Partition id
    pub partition_id: i32,
    /// Table id
    pub table_id: u8,
    /// Block number
    pub block_number: i32,
    /// Slot number
    pub slot_number: i32,
    /// Operating system error
    pub os_error: i32,
    /// Statement number
    pub stmt_number: u8,
    /// Call number
    pub call_number: u8,
    /// Padding word
    pub pad1: i32,
    /// Number of successful iterations
    pub success_iters: i32,
    /// Raw error message, decoded by the session's string converter
    pub error_message: Vec<u8>,
}

impl Summary {
    /// Parse a summary from the session's in-stream
    pub async fn read(session: &mut Session) -> Result<Self> {
        let mut summary = Summary {
            end_of_call_status: session.get_int(4, true, true).await?,
            end_to_end_seq: session.get_int(2, true, true).await?,
            cur_row_number: session.get_int(4, true, true).await?,
            ret_code: session.get_int(2, true, true).await? as u32,
            array_elem_with_error: session.get_int(2, true, true).await?,
            array_elem_errno: session.get_int(2, true, true).await?,
            cursor_id: session.get_int(2, true, true).await?,
            error_pos: session.get_int(2, true, true).await?,
            sql_type: session.get_byte().await?,
            fatal: session.get_byte().await?,
            flags: session.get_int(2, true, true).await?,
            user_cursor_opt: session.get_int(2, true, true).await?,
            upi_param: session.get_byte().await?,
            warning_flag: session.get_byte().await?,
            rba: session.get_int(4, true, true).await?,
            partition_id: session.get_int(2, true, true).await?,
            table_id: session.get_byte().await?,
            block_number: session.get_int(4, true, true).await?,
            slot_number: session.get_int(2, true, true).await?,
            os_error: session.get_int(4, true, true).await?,
            stmt_number: session.get_byte().await?,
            call_number: session.get_byte().await?,
            pad1: session.get_int(2, true, true).await?,
            success_iters: session.get_int(4, true, true).await?,
            ..Default::default()
        };
        if summary.ret_code != 0 {
            summary.error_message = session.get_clr().await?;
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectionOption;

    fn encode_summary(ret_code: u32, message: &[u8]) -> Vec<u8> {
        let mut session = Session::new(ConnectionOption::new("localhost", 1521));
        session.put_int(0, 4, true, true); // end_of_call_status
        session.put_int(0, 2, true, true); // end_to_end_seq
        session.put_int(0, 4, true, true); // cur_row_number
        session.put_int(ret_code as i64, 2, true, true);
        session.put_int(0, 2, true, true); // array_elem_with_error
        session.put_int(0, 2, true, true); // array_elem_errno
        session.put_int(7, 2, true, true); // cursor_id
        session.put_int(0, 2, true, true); // error_pos
        session.put_byte(0); // sql_type
        session.put_byte(0); // fatal
        session.put_int(0, 2, true, true); // flags
        session.put_int(0, 2, true, true); // user_cursor_opt
        session.put_byte(0); // upi_param
        session.put_byte(0); // warning_flag
        session.put_int(0, 4, true, true); // rba
        session.put_int(0, 2, true, true); // partition_id
        session.put_byte(0); // table_id
        session.put_int(0, 4, true, true); // block_number
        session.put_int(0, 2, true, true); // slot_number
        session.put_int(0, 4, true, true); // os_error
        session.put_byte(0); // stmt_number
        session.put_byte(0); // call_number
        session.put_int(0, 2, true, true); // pad1
        session.put_int(0, 4, true, true); // success_iters
        if ret_code != 0 {
            session.put_clr(message);
        }
        session.out_bytes().to_vec()
    }

    #[tokio::test]
    async fn parse_success_summary() {
        let mut session = Session::new(ConnectionOption::new("localhost", 1521));
        session.seed_in_buffer(encode_summary(0, b""));
        let summary = Summary::read(&mut session).await.unwrap();
        assert_eq!(summary.ret_code, 0);
        assert_eq!(summary.cursor_id, 7);
        assert!(summary.error_message.is_empty());
    }

    #[tokio::test]
    async fn parse_error_summary() {
        let mut session = Session::new(ConnectionOption::new("localhost", 1521));
        session.seed_in_buffer(encode_summary(1403, b"ORA-01403: no data found"));
        let summary = Summary::read(&mut session).await.unwrap();
        assert_eq!(summary.ret_code, 1403);
        assert_eq!(summary.error_message, b"ORA-01403: no data found");
    }
}
